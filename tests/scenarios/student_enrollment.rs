//! Scenario: enrolling students through a query-then-create handler
//!
//! Steps:
//! 1. Create a student with only the required `student_name`
//! 2. Create the same student again, the existing one comes back
//! 3. Query by course, soft-deleted students stay hidden

use serde_json::{json, Value};
use tessera::{Operation, Params};

use crate::common::*;

#[test]
fn scenario_first_enrollment_creates_one_record() {
    let env = TestEnv::new(&school_schema());

    let student = env
        .dispatcher
        .create("student", json!({"student_name": "Robert Redford"}))
        .unwrap();

    assert_eq!(env.created_types(), vec!["student"]);
    assert_eq!(student.id(), Some("1".to_string()));
    assert_eq!(student.get("student_name"), Some(json!("Robert Redford")));
}

#[test]
fn scenario_second_enrollment_returns_existing_record() {
    let env = TestEnv::new(&school_schema());

    let first = env
        .dispatcher
        .create("student", json!({"student_name": "Robert Redford"}))
        .unwrap();
    let second = env
        .dispatcher
        .create("student", json!({"student_name": "Robert Redford"}))
        .unwrap();

    assert_eq!(second.id(), first.id());
    assert_eq!(second.native(), first.native());
    assert_eq!(env.controller.count(Operation::Create, "student"), 1);
    assert_eq!(env.controller.objects("student").len(), 1);
}

#[test]
fn scenario_course_query_skips_removed_students() {
    let env = TestEnv::new(&school_schema());
    env.seed("student", json!({"student_name": "Ann", "course": "Art Drama", "status": "active"}));
    env.seed("student", json!({"student_name": "Bob", "course": "Art Drama", "status": "removed"}));
    env.seed("student", json!({"student_name": "Cid", "course": "Art Drama", "status": "active"}));

    let found = env
        .dispatcher
        .query("student", json!({"course": "Art Drama"}), Params::new())
        .unwrap();

    let names: Vec<Value> = found.iter().filter_map(|s| s.get("student_name")).collect();
    assert_eq!(names, vec![json!("Ann"), json!("Cid")]);
}
