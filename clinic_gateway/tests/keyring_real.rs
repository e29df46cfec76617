use std::time::{SystemTime, UNIX_EPOCH};

use clinic_core::{Timestamp, UserId};
use clinic_gateway::{KeyringSessionPersistence, Session, SessionPersistence, UserIdentity};

const TEST_SERVICE: &str = "clinic-keyring-integration-tests";

#[test]
fn keyring_round_trip_save_load_clear() {
    let profile = format!(
        "profile-{}-{}",
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos()
    );
    let first = KeyringSessionPersistence::new(TEST_SERVICE, &profile);
    let second = KeyringSessionPersistence::new(TEST_SERVICE, &format!("{profile}-second"));

    first.clear().expect("cleanup before test should succeed");
    second.clear().expect("cleanup before test should succeed");

    let session = Session {
        access_token: Some("access-token-test".to_owned()),
        refresh_token: Some("refresh-token-test".to_owned()),
        user: Some(UserIdentity {
            id: UserId::new("u-1"),
            name: Some("Front Desk".to_owned()),
            email: Some("desk@clinic.test".to_owned()),
            role: Some("admin".to_owned()),
        }),
        updated_at: Some(Timestamp::from_epoch_secs(1_900_000_000).expect("valid timestamp")),
    };
    let second_session = Session {
        access_token: Some("second-access".to_owned()),
        refresh_token: Some("second-refresh".to_owned()),
        user: None,
        updated_at: None,
    };

    first.save(&session).expect("saving session in keyring should succeed");
    second
        .save(&second_session)
        .expect("saving second session in keyring should succeed");

    assert_eq!(first.load().expect("load first"), Some(session));
    assert_eq!(second.load().expect("load second"), Some(second_session));

    first.clear().expect("clearing session in keyring should succeed");
    assert_eq!(first.load().expect("load after clear"), None);
    assert!(
        second
            .load()
            .expect("loading second session after first clear should succeed")
            .is_some()
    );

    second.clear().expect("final cleanup should succeed");
}
