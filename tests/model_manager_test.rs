use std::env;

use mailroom::{ModelManager, ModelSpec};

fn test_spec() -> ModelSpec {
    ModelSpec::new(
        "intent-test",
        "http://localhost:9/model.onnx",
        "http://localhost:9/tokenizer.json",
    )
}

#[test]
fn test_default_models_dir() {
    // Test with environment variable
    env::set_var("MAILROOM_CACHE", "/tmp/mailroom-test-cache");
    let path = ModelManager::default_models_dir();
    assert!(path
        .to_str()
        .unwrap()
        .contains("/tmp/mailroom-test-cache/models"));
    env::remove_var("MAILROOM_CACHE");

    // Test without environment variable
    let path = ModelManager::default_models_dir();
    assert!(path.to_str().unwrap().contains("mailroom"));
}

#[test]
fn test_model_dir_is_per_spec() {
    let manager = ModelManager::new("/tmp/mailroom-mm-test/models").unwrap();
    let spec = test_spec();
    assert!(manager.model_dir(&spec).ends_with("intent-test"));
    assert!(!manager.is_downloaded(&spec));
}

#[test]
fn test_verify_missing_artifacts_is_false() {
    let manager = ModelManager::new("/tmp/mailroom-mm-verify/models").unwrap();
    assert!(!manager.verify(&test_spec()).unwrap());
}

#[tokio::test]
#[ignore = "downloads model artifacts over the network"]
async fn test_download_roundtrip() {
    let manager = ModelManager::new("/tmp/mailroom-mm-download/models").unwrap();
    let spec = ModelSpec::new(
        "intent-download-test",
        env::var("MAILROOM_TEST_MODEL_URL").expect("set MAILROOM_TEST_MODEL_URL"),
        env::var("MAILROOM_TEST_TOKENIZER_URL").expect("set MAILROOM_TEST_TOKENIZER_URL"),
    );

    manager.remove_download(&spec).unwrap();
    assert!(!manager.is_downloaded(&spec));

    manager.ensure_downloaded(&spec).await.unwrap();
    assert!(manager.is_downloaded(&spec));
    assert!(manager.verify(&spec).unwrap());
}
