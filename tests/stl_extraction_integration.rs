mod common;

use common::{build_zip, spawn_server};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

const ALL_MESHES: [&str; 10] = [
    "Left_InternalStructure_Hollow.STL",
    "Left_FootShoe.STL",
    "Left_Skeleton.STL",
    "Left_Insole_Floor.STL",
    "Left_Insole_Roof.STL",
    "Right_FootShoe.STL",
    "Right_Insole_Floor.STL",
    "Right_Insole_Roof.STL",
    "Right_InternalStructure_Hollow.STL",
    "Right_Skeleton.STL",
];

async fn register(http: &reqwest::Client, base_url: &str, username: &str) {
    let res = http
        .post(format!("{base_url}/api/register/"))
        .json(&json!({
            "email": format!("{username}@clinic.test"),
            "username": username,
            "password": "correct horse",
            "password2": "correct horse"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
}

async fn user_id(http: &reqwest::Client, base_url: &str, username: &str) -> i64 {
    let users: Vec<Value> = http
        .get(format!("{base_url}/api/users/?search={username}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    users[0]["id"].as_i64().unwrap()
}

async fn upload_examination(
    http: &reqwest::Client,
    base_url: &str,
    customer_id: i64,
    zip: Vec<u8>,
) -> i64 {
    let form = Form::new()
        .text("customer_id", customer_id.to_string())
        .text("design_title", "Daily insoles")
        .text("single_foot", "false")
        .part("download", Part::bytes(zip).file_name("export.zip"));

    let res = http
        .post(format!("{base_url}/api/examinations/create/"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let exam: Value = res.json().await.unwrap();
    exam["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_full_flow_register_upload_extract_download() {
    let server = spawn_server(&[]).await;
    let http = reqwest::Client::new();

    register(&http, &server.base_url, "orthopedist").await;
    let customer_id = user_id(&http, &server.base_url, "orthopedist").await;

    let mut entries: Vec<(&str, &[u8])> =
        ALL_MESHES.iter().map(|n| (*n, n.as_bytes())).collect();
    entries.push(("scan_report.pdf", b"%PDF"));
    let exam_id = upload_examination(&http, &server.base_url, customer_id, build_zip(&entries)).await;

    // Unfiltered: every mesh, in canonical order
    let body: Value = http
        .get(format!("{}/api/examinations/{exam_id}/fetch-stl/", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["filename"].as_str().unwrap())
        .collect();
    assert_eq!(names, ALL_MESHES);

    // Filtered, with a name outside the allow-list
    let body: Value = http
        .get(format!(
            "{}/api/examinations/{exam_id}/fetch-stl/?filenames=Left_Skeleton.STL&filenames=NotARealFile.STL",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);

    let on_disk = server
        .media_root
        .join(format!("stl_files/{exam_id}/Left_Skeleton.STL"));
    assert_eq!(std::fs::read(on_disk).unwrap(), b"Left_Skeleton.STL");

    let link = files[0]["download_link"].as_str().unwrap();
    let served = http.get(link).send().await.unwrap();
    assert_eq!(served.status(), 200);
    assert_eq!(served.bytes().await.unwrap().as_ref(), b"Left_Skeleton.STL");
}

#[tokio::test]
async fn test_flat_layout_and_no_matching_entries() {
    let server = spawn_server(&[("STL_LAYOUT", "flat")]).await;
    let http = reqwest::Client::new();

    register(&http, &server.base_url, "lab").await;
    let customer_id = user_id(&http, &server.base_url, "lab").await;

    let with_mesh = upload_examination(
        &http,
        &server.base_url,
        customer_id,
        build_zip(&[("Right_FootShoe.STL", b"solid shoe")]),
    )
    .await;
    let body: Value = http
        .get(format!("{}/api/examinations/{with_mesh}/fetch-stl/", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["files"][0]["download_link"],
        format!("{}/media/stl_files/Right_FootShoe.STL", server.base_url)
    );
    assert!(server.media_root.join("stl_files/Right_FootShoe.STL").exists());

    let without_mesh = upload_examination(
        &http,
        &server.base_url,
        customer_id,
        build_zip(&[("model.obj", b"v 0 0 0")]),
    )
    .await;
    let res = http
        .get(format!(
            "{}/api/examinations/{without_mesh}/fetch-stl/",
            server.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "No STL files were found in ZIP.");
    assert_eq!(body["code"], "no_matching_entries");
}
