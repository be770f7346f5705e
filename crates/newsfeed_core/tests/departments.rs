use newsfeed_core::db::open_db_in_memory;
use newsfeed_core::{
    Department, DepartmentRepository, DepartmentService, Organization, OrganizationRepository,
    SqliteDepartmentRepository, SqliteOrganizationRepository, SqliteUserRepository, User,
    UserRepository,
};
use rusqlite::Connection;

fn service(
    conn: &Connection,
) -> DepartmentService<SqliteDepartmentRepository<'_>, SqliteOrganizationRepository<'_>> {
    DepartmentService::new(
        SqliteDepartmentRepository::try_new(conn).unwrap(),
        SqliteOrganizationRepository::try_new(conn).unwrap(),
    )
}

fn setup(conn: &Connection) -> (Organization, User) {
    let organization = Organization::new("Acme Corp");
    SqliteOrganizationRepository::try_new(conn)
        .unwrap()
        .create_organization(&organization)
        .unwrap();
    let mut user = User::new(organization.id, "mia@acme.test");
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .save_user(&mut user)
        .unwrap();
    (organization, user)
}

#[test]
fn add_departments_title_cases_and_reuses_by_slug() {
    let conn = open_db_in_memory().unwrap();
    let (organization, user) = setup(&conn);
    let service = service(&conn);

    let first = service
        .add_departments(&user, &["  human resources ", "r&d"])
        .unwrap();
    assert_eq!(first[0].name, "Human Resources");
    assert_eq!(first[0].slug, "human-resources");
    assert_eq!(first[1].name, "R&D");
    assert_eq!(first[1].slug, "rd");

    let again = service.add_departments(&user, &["HUMAN RESOURCES", "   "]).unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].id, first[0].id);

    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    assert_eq!(repo.list_members(first[0].id).unwrap(), vec![user.id]);
    assert_eq!(repo.list_user_departments(user.id).unwrap().len(), 2);
    assert!(first
        .iter()
        .all(|department| department.organization_id == organization.id));
}

#[test]
fn get_departments_joins_labels_in_slug_order() {
    let conn = open_db_in_memory().unwrap();
    let (_, user) = setup(&conn);
    let service = service(&conn);
    service.add_departments(&user, &["sales", "engineering"]).unwrap();

    assert_eq!(
        service.get_departments(&user).unwrap(),
        "Engineering - Acme Corp,Sales - Acme Corp"
    );
    assert_eq!(
        service.department(&user).unwrap().map(|d| d.name),
        Some("Engineering".to_string())
    );
}

#[test]
fn user_without_departments_has_empty_label_and_no_first_department() {
    let conn = open_db_in_memory().unwrap();
    let (_, user) = setup(&conn);
    let service = service(&conn);

    assert_eq!(service.get_departments(&user).unwrap(), "");
    assert!(service.department(&user).unwrap().is_none());
}

#[test]
fn leaving_a_department_drops_co_membership() {
    let conn = open_db_in_memory().unwrap();
    let (organization, user) = setup(&conn);
    let service = service(&conn);
    let mut peer = User::new(organization.id, "noah@acme.test");
    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .save_user(&mut peer)
        .unwrap();

    let joined = service.add_departments(&user, &["ops"]).unwrap();
    service.add_departments(&peer, &["Ops"]).unwrap();

    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    let mut co_members = repo.co_member_ids(user.id).unwrap();
    co_members.sort();
    let mut expected = vec![user.id, peer.id];
    expected.sort();
    assert_eq!(co_members, expected);

    service.leave_department(&user, &joined[0]).unwrap();
    assert!(repo.co_member_ids(user.id).unwrap().is_empty());
}

#[test]
fn department_slug_is_unique_per_organization_only() {
    let conn = open_db_in_memory().unwrap();
    let orgs = SqliteOrganizationRepository::try_new(&conn).unwrap();
    let first = Organization::new("First");
    let second = Organization::new("Second");
    orgs.create_organization(&first).unwrap();
    orgs.create_organization(&second).unwrap();

    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    repo.create_department(&Department::from_input(first.id, "support"))
        .unwrap();
    repo.create_department(&Department::from_input(second.id, "support"))
        .unwrap();
    let duplicate = repo.create_department(&Department::from_input(first.id, "Support"));
    assert!(duplicate.unwrap_err().is_unique_violation());
}

#[test]
fn organizations_can_be_renamed_but_keep_slug() {
    let conn = open_db_in_memory().unwrap();
    let orgs = SqliteOrganizationRepository::try_new(&conn).unwrap();
    let organization = Organization::new("Initech Labs");
    orgs.create_organization(&organization).unwrap();

    orgs.rename_organization(organization.id, "Initech").unwrap();

    let loaded = orgs
        .get_organization_by_slug("initech-labs")
        .unwrap()
        .unwrap();
    assert_eq!(loaded.name, "Initech");
    assert_eq!(loaded.id, organization.id);

    let blank_slug = Organization::with_slug("Blank Slug Co", "");
    orgs.create_organization(&blank_slug).unwrap();
    let loaded = orgs.get_organization(blank_slug.id).unwrap().unwrap();
    assert_eq!(loaded.slug, "blank-slug-co");
}
