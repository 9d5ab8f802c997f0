use assetdesk::config::DatabaseConfig;
use assetdesk::db;
use assetdesk::department_path::{find_by_path, DepartmentResolver};
use assetdesk::entity::department::{self, DepartmentTree};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};

async fn setup() -> DatabaseConnection {
    db::init_database(&DatabaseConfig::sqlite_memory())
        .await
        .expect("in-memory database")
}

async fn department_count(db: &DatabaseConnection) -> u64 {
    department::Entity::find().count(db).await.unwrap()
}

#[tokio::test]
async fn builds_hierarchy_from_label() {
    let db = setup().await;
    let mut resolver = DepartmentResolver::new();

    let leaf = resolver
        .resolve(&db, "본사 경영지원본부 인사팀")
        .await
        .unwrap()
        .expect("leaf id");

    let rows = department::Entity::find()
        .order_by_asc(department::Column::Depth)
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(resolver.created(), 3);

    let paths: Vec<&str> = rows.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(paths, vec!["본사", "본사/경영지원본부", "본사/경영지원본부/인사팀"]);
    assert_eq!(rows[0].depth, 0);
    assert_eq!(rows[0].parent_id, None);
    assert_eq!(rows[1].depth, 1);
    assert_eq!(rows[1].parent_id, Some(rows[0].id));
    assert_eq!(rows[2].depth, 2);
    assert_eq!(rows[2].parent_id, Some(rows[1].id));
    assert_eq!(rows[2].id, leaf);
    assert_eq!(rows[2].name, "인사팀");
}

#[tokio::test]
async fn resolving_twice_creates_nothing_new() {
    let db = setup().await;

    let first = DepartmentResolver::new()
        .resolve(&db, "본사 경영지원본부 인사팀")
        .await
        .unwrap();

    let mut second_resolver = DepartmentResolver::new();
    let second = second_resolver
        .resolve(&db, "본사  경영지원본부\t인사팀 ")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second_resolver.created(), 0);
    assert_eq!(department_count(&db).await, 3);
}

#[tokio::test]
async fn shared_prefix_is_reused() {
    let db = setup().await;
    let mut resolver = DepartmentResolver::new();

    resolver.resolve(&db, "본사 경영지원본부 인사팀").await.unwrap();
    resolver.resolve(&db, "본사 경영지원본부 총무팀").await.unwrap();

    assert_eq!(resolver.created(), 4);
    assert_eq!(department_count(&db).await, 4);

    let parent = find_by_path(&db, "본사/경영지원본부").await.unwrap().unwrap();
    let general = find_by_path(&db, "본사/경영지원본부/총무팀").await.unwrap().unwrap();
    assert_eq!(general.parent_id, Some(parent.id));
}

#[tokio::test]
async fn memo_is_filled_after_resolution() {
    let db = setup().await;
    let mut resolver = DepartmentResolver::new();

    let leaf = resolver.resolve(&db, "본사 IT팀").await.unwrap();
    assert_eq!(resolver.cached("본사/IT팀"), leaf);
    assert!(resolver.cached("본사").is_some());
    assert_eq!(resolver.cached("본사/영업팀"), None);
}

#[tokio::test]
async fn blank_label_resolves_to_none() {
    let db = setup().await;
    let mut resolver = DepartmentResolver::new();

    assert_eq!(resolver.resolve(&db, "   ").await.unwrap(), None);
    assert_eq!(department_count(&db).await, 0);
}

#[tokio::test]
async fn concurrent_resolvers_agree_on_leaf() {
    let db = setup().await;

    let mut a = DepartmentResolver::new();
    let mut b = DepartmentResolver::new();
    let (left, right) = tokio::join!(
        a.resolve(&db, "본사 경영지원본부 인사팀"),
        b.resolve(&db, "본사 경영지원본부 인사팀"),
    );

    assert_eq!(left.unwrap(), right.unwrap());
    assert_eq!(department_count(&db).await, 3);
    assert_eq!(a.created() + b.created(), 3);
}

#[tokio::test]
async fn racing_resolvers_count_each_node_once() {
    let db = setup().await;

    let mut resolvers: Vec<DepartmentResolver> = (0..8).map(|_| DepartmentResolver::new()).collect();
    let results = futures::future::join_all(
        resolvers
            .iter_mut()
            .map(|r| r.resolve(&db, "본사 경영지원본부 인사팀")),
    )
    .await;

    let leaves: Vec<Option<i64>> = results.into_iter().map(|r| r.unwrap()).collect();
    assert!(leaves.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(department_count(&db).await, 3);
    assert_eq!(resolvers.iter().map(|r| r.created()).sum::<usize>(), 3);
}

#[tokio::test]
async fn tree_nests_children_under_parents() {
    let db = setup().await;
    let mut resolver = DepartmentResolver::new();
    resolver.resolve(&db, "본사 경영지원본부 인사팀").await.unwrap();
    resolver.resolve(&db, "본사 IT팀").await.unwrap();
    resolver.resolve(&db, "지사").await.unwrap();

    let tree = DepartmentTree::build(department::Entity::find().all(&db).await.unwrap());

    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].path, "본사");
    assert_eq!(tree[0].children.len(), 2);
    assert_eq!(tree[1].path, "지사");
    assert!(tree[1].children.is_empty());
}
