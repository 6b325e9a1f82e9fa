//! Scenario: process names over backend names
//!
//! The backend calls the course `training`; callers only ever see `course`.

use serde_json::json;
use tessera::application::ControllerMapping;
use tessera::Params;

use crate::common::*;

#[test]
fn scenario_course_maps_to_training() {
    let mapping =
        ControllerMapping::new().object("student", |m| m.map_attr("course", ["training"]));
    let env = TestEnv::with_mapping(&school_schema(), mapping);
    env.seed("student", json!({"student_name": "Ann", "training": "Art Comedy"}));

    let student = env
        .dispatcher
        .query_single("student", json!({"student_name": "Ann"}), Params::new())
        .unwrap()
        .unwrap();
    assert_eq!(student.get("course"), Some(json!("Art Comedy")));

    student.set("course", "Art Drama").unwrap();
    assert_eq!(student.native()["training"], json!("Art Drama"));
    assert_eq!(student.get("course"), Some(json!("Art Drama")));

    env.dispatcher.update(&student, Params::new()).unwrap();
    assert_eq!(env.controller.objects("student")[0]["training"], json!("Art Drama"));
}

#[test]
fn scenario_status_values_translate_both_ways() {
    let mapping = ControllerMapping::new().object("student", |m| {
        m.map_attr("status", ["state"])
            .map_value("status", "active", "ACTIVE")
            .undefine("internal_flag")
    });
    let env = TestEnv::with_mapping(&school_schema(), mapping);
    env.seed(
        "student",
        json!({"student_name": "Ann", "state": "ACTIVE", "internal_flag": true}),
    );

    let found = env
        .dispatcher
        .query("student", json!({"status": "active"}), Params::new())
        .unwrap();
    assert_eq!(found.len(), 1);

    let student = found.first().unwrap();
    assert_eq!(student.get("status"), Some(json!("active")));
    assert_eq!(student.get("internal_flag"), None);
    assert!(student.set("internal_flag", false).is_err());
}
