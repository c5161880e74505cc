use std::env;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

pub fn todos_fixture() -> serde_json::Value {
    return serde_json::json!([
        {
            "id": 1,
            "name": "Buy oats",
            "description": "Rolled, not steel cut",
            "completed": false
        },
        {
            "id": 2,
            "name": "Water plants",
            "description": "Only the ones on the balcony",
            "completed": true
        },
        {
            "id": 3,
            "name": "Call the bank",
            "description": "",
            "completed": false
        }
    ]);
}

pub fn todo_fixture(id: i64, name: &str, completed: bool) -> serde_json::Value {
    return serde_json::json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "completed": completed
    });
}

pub fn auth_fixture(id: i64, token: &str) -> serde_json::Value {
    return serde_json::json!({
        "message": "Login successful",
        "user": { "id": id, "username": "oat", "email": "a@b.com" },
        "token": token
    });
}
