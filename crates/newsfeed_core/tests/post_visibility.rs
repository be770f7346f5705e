use newsfeed_core::db::open_db_in_memory;
use newsfeed_core::{
    accessible_posts, DepartmentRepository, MapCatalog, Organization, OrganizationId,
    OrganizationRepository, Post, PostFilter, PostId, PostRepository, PostService, ServiceError,
    SharedWith, SqliteDepartmentRepository, SqliteOrganizationRepository, SqlitePostRepository,
    SqliteUserRepository, User, UserId, UserRepository, PRIORITY_EXISTS_MESSAGE,
};
use rusqlite::Connection;
use std::collections::HashSet;

fn create_org(conn: &Connection, name: &str) -> OrganizationId {
    let repo = SqliteOrganizationRepository::try_new(conn).unwrap();
    repo.create_organization(&Organization::new(name)).unwrap()
}

fn create_user(conn: &Connection, org: OrganizationId, email: &str) -> UserId {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let mut user = User::new(org, email);
    repo.save_user(&mut user).unwrap();
    user.id
}

fn join(conn: &Connection, org: OrganizationId, slug: &str, user: UserId) {
    let repo = SqliteDepartmentRepository::try_new(conn).unwrap();
    let (department, _) = repo.get_or_create_department(org, slug, slug).unwrap();
    repo.add_member(department.id, user).unwrap();
}

fn post(
    conn: &Connection,
    org: OrganizationId,
    author: UserId,
    shared_with: SharedWith,
    priority: bool,
) -> PostId {
    let repo = SqlitePostRepository::try_new(conn).unwrap();
    repo.create_post(&Post::new(org, author, "body", shared_with).with_priority(priority))
        .unwrap()
}

fn visible_ids(conn: &Connection, user: UserId, org: OrganizationId) -> HashSet<PostId> {
    let departments = SqliteDepartmentRepository::try_new(conn).unwrap();
    let posts = SqlitePostRepository::try_new(conn).unwrap();
    accessible_posts(&departments, &posts, user, org)
        .unwrap()
        .into_iter()
        .map(|post| post.id)
        .collect()
}

fn service(
    conn: &Connection,
) -> PostService<SqliteDepartmentRepository<'_>, SqlitePostRepository<'_>> {
    PostService::new(
        SqliteDepartmentRepository::try_new(conn).unwrap(),
        SqlitePostRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn user_without_department_sees_only_own_posts_in_organization() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let other_org = create_org(&conn, "Globex");
    let loner = create_user(&conn, org, "loner@acme.test");
    let colleague = create_user(&conn, org, "colleague@acme.test");

    let own = post(&conn, org, loner, SharedWith::MyDepartment, false);
    let own_shared = post(&conn, org, loner, SharedWith::AllDepartments, false);
    post(&conn, other_org, loner, SharedWith::MyDepartment, false);
    post(&conn, org, colleague, SharedWith::AllDepartments, false);

    let expected: HashSet<PostId> = [own, own_shared].into_iter().collect();
    assert_eq!(visible_ids(&conn, loner, org), expected);
}

#[test]
fn department_member_sees_org_wide_posts_and_all_co_member_posts() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let other_org = create_org(&conn, "Globex");
    let alice = create_user(&conn, org, "alice@acme.test");
    let bob = create_user(&conn, org, "bob@acme.test");
    let carol = create_user(&conn, org, "carol@acme.test");
    let outsider = create_user(&conn, other_org, "dan@globex.test");
    join(&conn, org, "sales", alice);
    join(&conn, org, "sales", bob);
    join(&conn, org, "legal", carol);

    let alice_own = post(&conn, org, alice, SharedWith::MyDepartment, false);
    let bob_team = post(&conn, org, bob, SharedWith::MyDepartment, false);
    let carol_team = post(&conn, org, carol, SharedWith::MyDepartment, false);
    let carol_wide = post(&conn, org, carol, SharedWith::AllDepartments, false);
    // Co-member posts are not narrowed to the requested organization.
    let bob_elsewhere = post(&conn, other_org, bob, SharedWith::MyDepartment, false);
    let outsider_wide = post(&conn, other_org, outsider, SharedWith::AllDepartments, false);

    let visible = visible_ids(&conn, alice, org);
    assert!(visible.contains(&alice_own));
    assert!(visible.contains(&bob_team));
    assert!(visible.contains(&carol_wide));
    assert!(visible.contains(&bob_elsewhere));
    assert!(!visible.contains(&carol_team));
    assert!(!visible.contains(&outsider_wide));
    assert_eq!(visible.len(), 4);
}

#[test]
fn co_members_are_unioned_across_departments() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let alice = create_user(&conn, org, "alice@acme.test");
    let bob = create_user(&conn, org, "bob@acme.test");
    let carol = create_user(&conn, org, "carol@acme.test");
    join(&conn, org, "sales", alice);
    join(&conn, org, "sales", bob);
    join(&conn, org, "legal", alice);
    join(&conn, org, "legal", carol);

    let bob_post = post(&conn, org, bob, SharedWith::MyDepartment, false);
    let carol_post = post(&conn, org, carol, SharedWith::MyDepartment, false);

    let visible = visible_ids(&conn, alice, org);
    assert!(visible.contains(&bob_post));
    assert!(visible.contains(&carol_post));

    // Bob shares no department with Carol.
    assert!(!visible_ids(&conn, bob, org).contains(&carol_post));
}

#[test]
fn sql_and_in_memory_filters_agree() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let alice = create_user(&conn, org, "alice@acme.test");
    let bob = create_user(&conn, org, "bob@acme.test");
    post(&conn, org, alice, SharedWith::AllDepartments, true);
    post(&conn, org, bob, SharedWith::MyDepartment, false);
    post(&conn, org, bob, SharedWith::AllDepartments, true);

    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let everything = repo.filter_posts(&PostFilter::all()).unwrap();
    let filter = PostFilter::SharedWith(SharedWith::AllDepartments)
        .and(PostFilter::Priority(true))
        .or(PostFilter::CreatedBy(bob));

    let from_sql: HashSet<PostId> = repo
        .filter_posts(&filter)
        .unwrap()
        .into_iter()
        .map(|post| post.id)
        .collect();
    let in_memory: HashSet<PostId> = everything
        .iter()
        .filter(|post| filter.matches(post))
        .map(|post| post.id)
        .collect();

    assert_eq!(from_sql, in_memory);
    assert_eq!(repo.count_posts(&filter).unwrap(), 3);
}

#[test]
fn priority_false_always_passes() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let alice = create_user(&conn, org, "alice@acme.test");
    post(&conn, org, alice, SharedWith::MyDepartment, true);

    service(&conn).validate_priority(alice, org, false).unwrap();
}

#[test]
fn user_without_department_cannot_add_second_priority_post() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let alice = create_user(&conn, org, "alice@acme.test");
    let service = service(&conn);

    service.validate_priority(alice, org, true).unwrap();
    service
        .create_post(&Post::new(org, alice, "first", SharedWith::MyDepartment).with_priority(true))
        .unwrap();

    match service.validate_priority(alice, org, true).unwrap_err() {
        ServiceError::Validation(err) => {
            assert_eq!(err.field, "priority");
            assert_eq!(err.message, PRIORITY_EXISTS_MESSAGE);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn co_member_priority_post_blocks_another() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let bob = create_user(&conn, org, "bob@acme.test");
    let carol = create_user(&conn, org, "carol@acme.test");
    let outsider = create_user(&conn, org, "erin@acme.test");
    join(&conn, org, "design", bob);
    join(&conn, org, "design", carol);
    join(&conn, org, "finance", outsider);
    let service = service(&conn);

    service
        .create_post(&Post::new(org, bob, "launch", SharedWith::MyDepartment).with_priority(true))
        .unwrap();

    let rejected = service.create_post(
        &Post::new(org, carol, "me too", SharedWith::MyDepartment).with_priority(true),
    );
    assert!(matches!(rejected, Err(ServiceError::Validation(_))));

    // Bob's post is department-scoped, so another department is unaffected.
    service.validate_priority(outsider, org, true).unwrap();
}

#[test]
fn update_only_guards_promotion_to_priority() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let alice = create_user(&conn, org, "alice@acme.test");
    let service = service(&conn);

    let mut pinned = Post::new(org, alice, "pinned", SharedWith::MyDepartment).with_priority(true);
    service.create_post(&pinned).unwrap();
    pinned.content = "pinned, edited".to_string();
    service.update_post(&pinned).unwrap();

    let mut plain = Post::new(org, alice, "plain", SharedWith::MyDepartment);
    service.create_post(&plain).unwrap();
    plain.priority = true;
    assert!(matches!(
        service.update_post(&plain),
        Err(ServiceError::Validation(_))
    ));

    let stored = service.get_post(pinned.id).unwrap().unwrap();
    assert_eq!(stored.content, "pinned, edited");
}

#[test]
fn validation_message_goes_through_catalog() {
    let conn = open_db_in_memory().unwrap();
    let org = create_org(&conn, "Acme");
    let alice = create_user(&conn, org, "alice@acme.test");
    post(&conn, org, alice, SharedWith::MyDepartment, true);

    let catalog: MapCatalog = [(
        PRIORITY_EXISTS_MESSAGE,
        "Es existiert bereits ein Prioritätsbeitrag.",
    )]
    .into_iter()
    .collect();
    let service = PostService::with_catalog(
        SqliteDepartmentRepository::try_new(&conn).unwrap(),
        SqlitePostRepository::try_new(&conn).unwrap(),
        catalog,
    );

    match service.validate_priority(alice, org, true).unwrap_err() {
        ServiceError::Validation(err) => {
            assert_eq!(err.message, "Es existiert bereits ein Prioritätsbeitrag.")
        }
        other => panic!("unexpected error: {other}"),
    }
}
