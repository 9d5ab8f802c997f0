//! QR codes and printable asset labels

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::error::{AppError, AppResult};

/// Title printed on every label
pub const LABEL_TITLE: &str = "자산 관리 라벨";
/// Hint printed under the owner line
pub const LABEL_HINT: &str = "스캔하여 관리";

/// Asset page URL under `base`, or None when no base is configured
pub fn page_url(base: &str, asset_code: &str) -> Option<String> {
    let base = base.trim().trim_end_matches('/');
    if base.is_empty() {
        None
    } else {
        Some(format!("{}/assets/{}", base, asset_code))
    }
}

/// Render `value` as a standalone QR code SVG document
pub fn qr_svg(value: &str, size: u32) -> AppResult<String> {
    let code = QrCode::with_error_correction_level(value.as_bytes(), EcLevel::M)
        .map_err(|e| AppError::BadRequest(format!("cannot encode QR code: {}", e)))?;

    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(size, size)
        .quiet_zone(true)
        .build())
}

/// Render a 300x200 printable label: title, QR code, asset code and owner
pub fn label_svg(asset_code: &str, owner_name: &str, qr_value: &str) -> AppResult<String> {
    let qr = qr_svg(qr_value, 100)?;
    // Nest the QR document as an inner <svg> element.
    let qr = match qr.find("<svg") {
        Some(start) => &qr[start..],
        None => qr.as_str(),
    };

    Ok(format!(
        concat!(
            r#"<?xml version="1.0" standalone="yes"?>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="200" viewBox="0 0 300 200">"#,
            r##"<rect x="1" y="1" width="298" height="198" fill="#fff" stroke="#000" stroke-width="2"/>"##,
            r#"<text x="150" y="38" font-size="20" font-weight="bold" text-anchor="middle">{title}</text>"#,
            r#"<g transform="translate(20,60)">{qr}</g>"#,
            r#"<text x="145" y="105" font-size="18" font-weight="bold">{code}</text>"#,
            r#"<text x="145" y="130" font-size="14">소유자: {owner}</text>"#,
            r##"<text x="145" y="155" font-size="11" fill="#6b7280">{hint}</text>"##,
            "</svg>"
        ),
        title = LABEL_TITLE,
        qr = qr,
        code = escape_xml(asset_code),
        owner = escape_xml(owner_name),
        hint = LABEL_HINT,
    ))
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
