mod common;

use chrono::{Duration, Utc};
use common::RecordingMailer;
use launchpad::campaigns::CampaignRunner;
use launchpad::db::{EmailLogFilter, PageQuery, WaitlistCreate};
use launchpad::email::Templates;
use std::sync::Arc;
use url::Url;

fn templates() -> Templates {
    Templates::new(Url::parse("https://launchpad.example/").unwrap())
}

async fn seed(db: &launchpad::db::DbActorHandle, emails: &[&str]) {
    for email in emails {
        db.create_signup(WaitlistCreate {
            email: (*email).to_string(),
            ..WaitlistCreate::default()
        })
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn drip_never_resends_and_retries_failures() {
    let db = common::spawn_db("campaign-drip").await;
    seed(&db, &["a@example.com", "b@example.com", "c@example.com"]).await;

    let mailer = Arc::new(RecordingMailer::default());
    mailer.fail_for("b@example.com");
    let runner = CampaignRunner::new(
        db.clone(),
        mailer.clone(),
        templates(),
        std::time::Duration::ZERO,
    );

    // One day and an hour later, today's signups fall into the day-1 window.
    let later = Utc::now() + Duration::hours(25);

    let report = runner.run_drip(later, &[1, 3]).await.unwrap();
    assert_eq!(report.kind, "drip");
    assert_eq!(report.templates.len(), 2);
    assert_eq!(report.templates[0].template, "drip_day_1");
    assert_eq!(report.templates[0].eligible, 3);
    assert_eq!(report.templates[0].sent, 2);
    assert_eq!(report.templates[0].failed, 1);
    assert_eq!(report.templates[1].eligible, 0);
    assert_eq!(mailer.sent_to(), vec!["a@example.com", "c@example.com"]);

    // Second run: only the failed row is eligible again.
    mailer.recover();
    let report = runner.run_drip(later, &[1, 3]).await.unwrap();
    assert_eq!(report.templates[0].eligible, 1);
    assert_eq!(report.total_sent(), 1);
    assert_eq!(
        mailer.sent_to(),
        vec!["a@example.com", "c@example.com", "b@example.com"]
    );

    // Third run: nothing left.
    let report = runner.run_drip(later, &[1, 3]).await.unwrap();
    assert_eq!(report.total_sent(), 0);
    assert_eq!(report.templates[0].eligible, 0);

    let (logs, total) = db
        .list_email_logs(EmailLogFilter {
            page: PageQuery::default(),
            template: Some("drip_day_1".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(logs.iter().filter(|l| l.status == "failed").count(), 1);
}

#[tokio::test]
async fn drip_skips_unsubscribed_and_out_of_window_rows() {
    let db = common::spawn_db("campaign-window").await;
    seed(&db, &["a@example.com", "b@example.com"]).await;
    let b = db
        .get_waitlist_by_id(2)
        .await
        .unwrap()
        .expect("second signup");
    db.unsubscribe(b.unsubscribe_token).await.unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let runner = CampaignRunner::new(db, mailer.clone(), templates(), std::time::Duration::ZERO);

    // Signups made now are not yet one day old.
    let report = runner.run_drip(Utc::now(), &[1]).await.unwrap();
    assert_eq!(report.total_sent(), 0);

    let report = runner
        .run_drip(Utc::now() + Duration::hours(25), &[1])
        .await
        .unwrap();
    assert_eq!(report.total_sent(), 1);
    assert_eq!(mailer.sent_to(), vec!["a@example.com"]);
}

#[tokio::test]
async fn countdown_sends_only_the_due_template_once() {
    let db = common::spawn_db("campaign-countdown").await;
    seed(&db, &["a@example.com", "b@example.com"]).await;

    let mailer = Arc::new(RecordingMailer::default());
    let runner = CampaignRunner::new(
        db.clone(),
        mailer.clone(),
        templates(),
        std::time::Duration::ZERO,
    );
    let now = Utc::now();
    let offsets = [72, 24, 1];

    // No launch date -> nothing to do.
    let report = runner.run_countdown(now, None, &offsets).await.unwrap();
    assert!(report.templates.is_empty());

    // Launch is four days away -> no offset due yet.
    let report = runner
        .run_countdown(now, Some(now + Duration::days(4)), &offsets)
        .await
        .unwrap();
    assert!(report.templates.is_empty());

    // Launch in 20 hours -> the 24h template is due.
    let launch_at = now + Duration::hours(20);
    let report = runner
        .run_countdown(now, Some(launch_at), &offsets)
        .await
        .unwrap();
    assert_eq!(report.templates.len(), 1);
    assert_eq!(report.templates[0].template, "countdown_24h");
    assert_eq!(report.templates[0].sent, 2);

    let report = runner
        .run_countdown(now, Some(launch_at), &offsets)
        .await
        .unwrap();
    assert_eq!(report.templates[0].eligible, 0);
    assert_eq!(mailer.sent.lock().unwrap().len(), 2);

    let subject = mailer.sent.lock().unwrap()[0].subject.clone();
    assert!(!subject.is_empty());
    let html = mailer.sent.lock().unwrap()[0].html.clone();
    assert!(html.contains("https://launchpad.example/api/unsubscribe?token="));
}

#[tokio::test]
async fn overlapping_runs_send_each_email_once() {
    let db = common::spawn_db("campaign-overlap").await;
    seed(&db, &["a@example.com", "b@example.com", "c@example.com"]).await;

    let mailer = Arc::new(RecordingMailer::default());
    let lock = Arc::new(tokio::sync::Mutex::new(()));
    let delay = std::time::Duration::from_millis(50);
    let cron = CampaignRunner::new(db.clone(), mailer.clone(), templates(), delay)
        .with_run_lock(lock.clone());
    let ticker = CampaignRunner::new(db.clone(), mailer.clone(), templates(), delay)
        .with_run_lock(lock);

    let later = Utc::now() + Duration::hours(25);
    let (first, second) = tokio::join!(cron.run_drip(later, &[1]), ticker.run_drip(later, &[1]));
    let (first, second) = (first.unwrap(), second.unwrap());

    // Whichever run takes the lock second finds nothing left to send.
    assert_eq!(first.total_sent() + second.total_sent(), 3);
    assert_eq!(first.total_sent().min(second.total_sent()), 0);

    let mut sent = mailer.sent_to();
    sent.sort();
    assert_eq!(sent, vec!["a@example.com", "b@example.com", "c@example.com"]);
}
