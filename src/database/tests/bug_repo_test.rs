use super::*;
use crate::test_utils::{init_test_db, seed_user};

#[tokio::test]
async fn test_bug_insert_and_get() {
    let pool = init_test_db().await.pool;
    let user_id = seed_user(&pool, "tech").await;

    let bug = insert_bug(
        &pool,
        &NewBug {
            user_id,
            hardware_code: "HW-7",
            software_code: "2.4.1",
            bug_txt: "Scanner freezes on right foot",
        },
    )
    .await
    .unwrap();

    let fetched = get_bug(&pool, bug.id).await.unwrap().unwrap();
    assert_eq!(fetched.hardware_code, "HW-7");
    assert_eq!(fetched.user_id, user_id);
    assert!(get_bug(&pool, bug.id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_bug_json_uses_client_field_names() {
    let pool = init_test_db().await.pool;
    let user_id = seed_user(&pool, "tech").await;
    let bug = insert_bug(
        &pool,
        &NewBug {
            user_id,
            hardware_code: "HW-1",
            software_code: "1.0",
            bug_txt: "crash",
        },
    )
    .await
    .unwrap();

    let json = serde_json::to_value(&bug).unwrap();
    assert_eq!(json["hardwareCode"], "HW-1");
    assert_eq!(json["bugTxt"], "crash");
    assert!(json.get("user_id").is_none());
}

#[tokio::test]
async fn test_bug_lists_and_search() {
    let pool = init_test_db().await.pool;
    let first = seed_user(&pool, "first").await;
    let second = seed_user(&pool, "second").await;

    for (user_id, hw, text) in [
        (first, "HW-1", "Calibration drift"),
        (first, "HW-2", "USB disconnect"),
        (second, "HW-3", "calibration failed at boot"),
    ] {
        insert_bug(
            &pool,
            &NewBug {
                user_id,
                hardware_code: hw,
                software_code: "3.0",
                bug_txt: text,
            },
        )
        .await
        .unwrap();
    }

    let mine = list_user_bugs(&pool, first).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].hardware_code, "HW-2");

    assert_eq!(search_bugs(&pool, None).await.unwrap().len(), 3);
    assert_eq!(search_bugs(&pool, Some("calibration")).await.unwrap().len(), 2);
    assert_eq!(search_bugs(&pool, Some("hw-3")).await.unwrap().len(), 1);
}
