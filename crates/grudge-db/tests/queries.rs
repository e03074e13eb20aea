use grudge_db::Database;
use grudge_db::models::{NewEnemy, NewGrievance};

fn new_enemy(name: &str) -> NewEnemy<'_> {
    NewEnemy {
        name,
        nickname: None,
        twitter_handle: None,
        tweet_url: None,
        position_x: None,
        position_y: None,
        created_at: None,
    }
}

fn setup_user(db: &Database, email: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    db.create_user(&id, email, "argon2-hash-placeholder").unwrap();
    id
}

#[test]
fn insert_assigns_fresh_ids_and_preserves_created_at() {
    let db = Database::open_in_memory().unwrap();
    let user = setup_user(&db, "a@example.com");

    let mut enemy = new_enemy("Karl");
    enemy.created_at = Some("2024-02-02T02:02:02+00:00");
    let id = db.insert_enemy(&user, &enemy).unwrap();
    let other_id = db.insert_enemy(&user, &new_enemy("Other")).unwrap();
    assert_ne!(id, other_id);

    let row = db.get_enemy(&id, &user).unwrap().unwrap();
    assert_eq!(row.name, "Karl");
    assert_eq!(row.created_at, "2024-02-02T02:02:02+00:00");

    // Absent created_at falls back to the column default.
    let defaulted = db.get_enemy(&other_id, &user).unwrap().unwrap();
    assert!(!defaulted.created_at.is_empty());
}

#[test]
fn blank_name_is_rejected_by_the_schema() {
    let db = Database::open_in_memory().unwrap();
    let user = setup_user(&db, "a@example.com");

    assert!(db.insert_enemy(&user, &new_enemy("   ")).is_err());
    assert!(db.insert_enemy(&user, &new_enemy("")).is_err());
    assert!(db.list_enemies(&user).unwrap().is_empty());
}

#[test]
fn list_is_scoped_to_the_owner_and_ordered_by_recency() {
    let db = Database::open_in_memory().unwrap();
    let alice = setup_user(&db, "alice@example.com");
    let bob = setup_user(&db, "bob@example.com");

    let mut older = new_enemy("older");
    older.created_at = Some("2024-01-01T00:00:00+00:00");
    let mut newer = new_enemy("newer");
    newer.created_at = Some("2025-01-01T00:00:00+00:00");

    db.insert_enemy(&alice, &older).unwrap();
    db.insert_enemy(&alice, &newer).unwrap();
    db.insert_enemy(&bob, &new_enemy("bobs enemy")).unwrap();

    let listed = db.list_enemies(&alice).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "newer");
    assert_eq!(listed[1].name, "older");
    assert!(listed.iter().all(|e| e.user_id == alice));
}

#[test]
fn position_update_never_touches_another_users_row() {
    let db = Database::open_in_memory().unwrap();
    let alice = setup_user(&db, "alice@example.com");
    let bob = setup_user(&db, "bob@example.com");

    let alices = db.insert_enemy(&alice, &new_enemy("target")).unwrap();

    // Bob tries to move Alice's enemy: zero rows, record untouched.
    assert_eq!(db.update_enemy_position(&alices, &bob, 9.0, 9.0).unwrap(), 0);
    let row = db.get_enemy(&alices, &alice).unwrap().unwrap();
    assert_eq!(row.position_x, None);
    assert_eq!(row.position_y, None);

    assert_eq!(db.update_enemy_position(&alices, &alice, 40.0, 60.5).unwrap(), 1);
    let row = db.get_enemy(&alices, &alice).unwrap().unwrap();
    assert_eq!(row.position_x, Some(40.0));
    assert_eq!(row.position_y, Some(60.5));

    assert_eq!(db.update_enemy_position("no-such-id", &alice, 1.0, 1.0).unwrap(), 0);
}

#[test]
fn delete_enemy_cascades_to_grievances() {
    let db = Database::open_in_memory().unwrap();
    let user = setup_user(&db, "a@example.com");

    let enemy = db.insert_enemy(&user, &new_enemy("doomed")).unwrap();
    db.insert_grievance(
        &enemy,
        &NewGrievance {
            reason: "parked badly",
            tweet_url: None,
            created_at: None,
        },
    )
    .unwrap();

    assert_eq!(db.delete_enemy(&enemy, &user).unwrap(), 1);
    assert!(db.list_grievances_for_enemies(&[enemy.clone()]).unwrap().is_empty());

    // Gone means gone: a second delete is a zero-row no-op.
    assert_eq!(db.delete_enemy(&enemy, &user).unwrap(), 0);
}

#[test]
fn delete_is_scoped_to_the_owner() {
    let db = Database::open_in_memory().unwrap();
    let alice = setup_user(&db, "alice@example.com");
    let bob = setup_user(&db, "bob@example.com");

    let alices = db.insert_enemy(&alice, &new_enemy("alices")).unwrap();
    assert_eq!(db.delete_enemy(&alices, &bob).unwrap(), 0);
    assert!(db.get_enemy(&alices, &alice).unwrap().is_some());
}

#[test]
fn grievance_delete_checks_ownership_through_the_parent() {
    let db = Database::open_in_memory().unwrap();
    let alice = setup_user(&db, "alice@example.com");
    let bob = setup_user(&db, "bob@example.com");

    let enemy = db.insert_enemy(&alice, &new_enemy("parent")).unwrap();
    let grievance = db
        .insert_grievance(
            &enemy,
            &NewGrievance {
                reason: "loud music",
                tweet_url: Some("https://x.com/a/status/1"),
                created_at: Some("2024-05-05T05:05:05+00:00"),
            },
        )
        .unwrap();

    assert_eq!(db.delete_grievance(&grievance, &bob).unwrap(), 0);
    let remaining = db.list_grievances_for_enemies(&[enemy.clone()]).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].reason, "loud music");
    assert_eq!(remaining[0].created_at, "2024-05-05T05:05:05+00:00");

    assert_eq!(db.delete_grievance(&grievance, &alice).unwrap(), 1);
    assert!(db.list_grievances_for_enemies(&[enemy]).unwrap().is_empty());
}

#[test]
fn grievance_batch_fetch_spans_multiple_enemies() {
    let db = Database::open_in_memory().unwrap();
    let user = setup_user(&db, "a@example.com");

    let e1 = db.insert_enemy(&user, &new_enemy("one")).unwrap();
    let e2 = db.insert_enemy(&user, &new_enemy("two")).unwrap();
    let e3 = db.insert_enemy(&user, &new_enemy("three")).unwrap();
    for (enemy, reason) in [(&e1, "a"), (&e1, "b"), (&e2, "c")] {
        db.insert_grievance(
            enemy,
            &NewGrievance {
                reason,
                tweet_url: None,
                created_at: None,
            },
        )
        .unwrap();
    }

    let rows = db
        .list_grievances_for_enemies(&[e1.clone(), e2.clone(), e3.clone()])
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.iter().filter(|g| g.enemy_id == e1).count(), 2);
    assert_eq!(rows.iter().filter(|g| g.enemy_id == e2).count(), 1);
    assert_eq!(db.list_grievances_for_enemies(&[]).unwrap().len(), 0);
}

#[test]
fn duplicate_email_is_a_constraint_error() {
    let db = Database::open_in_memory().unwrap();
    setup_user(&db, "same@example.com");
    let id = uuid::Uuid::new_v4().to_string();
    assert!(db.create_user(&id, "same@example.com", "hash").is_err());

    let user = db.get_user_by_email("same@example.com").unwrap().unwrap();
    assert_ne!(user.id, id);
    assert!(db.get_user_by_email("missing@example.com").unwrap().is_none());
}

#[test]
fn migrations_are_idempotent_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grudge.db");

    let user = {
        let db = Database::open(&path).unwrap();
        let user = setup_user(&db, "a@example.com");
        db.insert_enemy(&user, &new_enemy("persisted")).unwrap();
        user
    };

    let db = Database::open(&path).unwrap();
    let listed = db.list_enemies(&user).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "persisted");
}
