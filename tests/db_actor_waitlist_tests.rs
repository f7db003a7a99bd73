mod common;

use launchpad::LaunchpadError;
use launchpad::db::{
    EmailLogCreate, PageQuery, RecordPatch, WaitlistCreate, WaitlistFilter, WaitlistPatch,
};

fn signup(email: &str, referred_by: Option<&str>) -> WaitlistCreate {
    WaitlistCreate {
        email: email.to_string(),
        referred_by: referred_by.map(str::to_string),
        source: Some("landing".to_string()),
        ..WaitlistCreate::default()
    }
}

#[tokio::test]
async fn duplicate_signup_is_a_conflict_and_stores_no_second_row() {
    let db = common::spawn_db("waitlist-dup").await;

    let first = db.create_signup(signup("alice@example.com", None)).await.unwrap();
    assert_eq!(first.referral_code.len(), 8);
    assert_eq!(db.waitlist_position(first.id).await.unwrap(), 1);

    let err = db
        .create_signup(signup("alice@example.com", None))
        .await
        .unwrap_err();
    assert!(
        matches!(err, LaunchpadError::Conflict { code: "ALREADY_REGISTERED", .. }),
        "{err:?}"
    );

    let (rows, total) = db.list_waitlist(WaitlistFilter::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn known_referral_codes_are_counted_and_unknown_ones_dropped() {
    let db = common::spawn_db("waitlist-ref").await;

    let referrer = db.create_signup(signup("ref@example.com", None)).await.unwrap();
    let referred = db
        .create_signup(signup("friend@example.com", Some(&referrer.referral_code)))
        .await
        .unwrap();
    assert_eq!(referred.referred_by.as_deref(), Some(referrer.referral_code.as_str()));

    let stray = db
        .create_signup(signup("stray@example.com", Some("ZZZZ9999")))
        .await
        .unwrap();
    assert!(stray.referred_by.is_none());

    let referrer = db
        .get_waitlist_by_code(referrer.referral_code.clone())
        .await
        .unwrap()
        .expect("referrer exists");
    assert_eq!(referrer.referral_count, 1);
    assert_eq!(db.waitlist_position(stray.id).await.unwrap(), 3);

    // A rejected duplicate must not bump the referrer again.
    let _ = db
        .create_signup(signup("friend@example.com", Some(&referrer.referral_code)))
        .await
        .unwrap_err();
    let referrer = db.get_waitlist_by_id(referrer.id).await.unwrap().unwrap();
    assert_eq!(referrer.referral_count, 1);
}

#[tokio::test]
async fn search_paging_unsubscribe_and_delete() {
    let db = common::spawn_db("waitlist-list").await;
    for email in ["a_1@example.com", "ab1@example.com", "bob@example.org"] {
        db.create_signup(signup(email, None)).await.unwrap();
    }

    // `_` is literal, not a wildcard.
    let (rows, total) = db
        .list_waitlist(WaitlistFilter {
            page: PageQuery::default(),
            search: Some("a_".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].email, "a_1@example.com");

    let (rows, total) = db
        .list_waitlist(WaitlistFilter {
            page: PageQuery { page: 2, per_page: 2 },
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 1);
    // Newest first, so the second page holds the oldest row.
    assert_eq!(rows[0].email, "a_1@example.com");

    let bob = rows_by_email(&db, "bob@example.org").await;
    assert!(!db.unsubscribe("not-a-token".to_string()).await.unwrap());
    assert!(db.unsubscribe(bob.unsubscribe_token.clone()).await.unwrap());
    assert!(db.get_waitlist_by_id(bob.id).await.unwrap().unwrap().unsubscribed);

    db.patch(RecordPatch::Waitlist {
        id: bob.id,
        patch: WaitlistPatch {
            unsubscribed: Some(false),
        },
    })
    .await
    .unwrap();
    assert!(!db.get_waitlist_by_id(bob.id).await.unwrap().unwrap().unsubscribed);

    assert!(db.delete_waitlist(bob.id).await.unwrap());
    assert!(!db.delete_waitlist(bob.id).await.unwrap());
    assert!(db.get_waitlist_by_id(bob.id).await.unwrap().is_none());
}

#[tokio::test]
async fn countdown_recipients_skip_sent_and_unsubscribed_rows() {
    let db = common::spawn_db("waitlist-countdown").await;
    let a = db.create_signup(signup("a@example.com", None)).await.unwrap();
    let b = db.create_signup(signup("b@example.com", None)).await.unwrap();
    let c = db.create_signup(signup("c@example.com", None)).await.unwrap();

    db.unsubscribe(c.unsubscribe_token.clone()).await.unwrap();
    db.record_email(EmailLogCreate::sent(&a.email, "countdown_24h", Some("id".into())))
        .await
        .unwrap();
    db.record_email(EmailLogCreate::failed(&b.email, "countdown_24h", "boom".into()))
        .await
        .unwrap();

    let recipients = db
        .list_countdown_recipients("countdown_24h".to_string())
        .await
        .unwrap();
    let emails: Vec<_> = recipients.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, vec!["b@example.com"]);

    // A sent log for another template does not exclude the row.
    let recipients = db
        .list_countdown_recipients("countdown_1h".to_string())
        .await
        .unwrap();
    assert_eq!(recipients.len(), 2);
}

async fn rows_by_email(
    db: &launchpad::db::DbActorHandle,
    email: &str,
) -> launchpad::db::DbWaitlistEntry {
    let (rows, _) = db
        .list_waitlist(WaitlistFilter {
            page: PageQuery::default(),
            search: Some(email.to_string()),
        })
        .await
        .unwrap();
    rows.into_iter()
        .find(|r| r.email == email)
        .expect("row exists")
}
