//! The two collections served by the API.

use crate::schema::{EntitySchema, FieldRule};

pub const STUDENTS: &str = "students";
pub const COURSES: &str = "courses";

/// Students carry free-form attributes.
pub fn student_schema() -> EntitySchema {
    EntitySchema {
        collection: STUDENTS,
        kind: "student",
        fields: Vec::new(),
        strict: false,
    }
}

pub fn course_schema() -> EntitySchema {
    EntitySchema {
        collection: COURSES,
        kind: "course",
        fields: vec![
            FieldRule::string("code").trim().max_length(16).required(),
            FieldRule::string("title").trim().max_length(255).required(),
            FieldRule::string("description").trim().max_length(2048),
            FieldRule::string("url").trim().max_length(512),
            // Single reference despite the plural name.
            FieldRule::reference("students", STUDENTS),
        ],
        strict: true,
    }
}

/// Every schema the API mounts, in route order.
pub fn all_schemas() -> Vec<EntitySchema> {
    vec![student_schema(), course_schema()]
}
