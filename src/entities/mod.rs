pub mod activity_group;
pub mod age_group;
pub mod business_listing;
pub mod contact_number;
pub mod disciplinary_action;
pub mod disciplinary_incident;
pub mod email_address;
pub mod emergency_contact;
pub mod learner;
pub mod learner_parent;
pub mod listing_image;
pub mod listing_product;
pub mod listing_service;
pub mod listing_tier;
pub mod message;
pub mod notification;
pub mod parent;
pub mod parent_address;
pub mod parent_permission;
pub mod participating_activity_group;
pub mod school_event;
pub mod school_grade;
pub mod severity_scale;
pub mod teacher;
pub mod user;
pub mod user_token;

pub mod prelude;
