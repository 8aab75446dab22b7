//! Permission constants, grouped per module, and the role to permission map.

pub const SCHOOL_READ: &str = "school.read";
pub const SCHOOL_WRITE: &str = "school.write";

pub const DISCIPLINE_READ: &str = "discipline.read";
pub const DISCIPLINE_WRITE: &str = "discipline.write";

pub const EVENTS_READ: &str = "events.read";
pub const EVENTS_WRITE: &str = "events.write";
pub const EVENTS_CONSENT: &str = "events.consent";

pub const COMMUNICATION_READ: &str = "communication.read";
pub const COMMUNICATION_WRITE: &str = "communication.write";

pub const LISTINGS_READ: &str = "listings.read";
pub const LISTINGS_WRITE: &str = "listings.write";

pub const USERS_MANAGE: &str = "users.manage";

pub const ALL: &[&str] = &[
    SCHOOL_READ,
    SCHOOL_WRITE,
    DISCIPLINE_READ,
    DISCIPLINE_WRITE,
    EVENTS_READ,
    EVENTS_WRITE,
    EVENTS_CONSENT,
    COMMUNICATION_READ,
    COMMUNICATION_WRITE,
    LISTINGS_READ,
    LISTINGS_WRITE,
    USERS_MANAGE,
];

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_PARENT: &str = "parent";
pub const ROLE_BUSINESS: &str = "business";

const TEACHER: &[&str] = &[
    SCHOOL_READ,
    SCHOOL_WRITE,
    DISCIPLINE_READ,
    DISCIPLINE_WRITE,
    EVENTS_READ,
    EVENTS_WRITE,
    COMMUNICATION_READ,
    COMMUNICATION_WRITE,
    LISTINGS_READ,
];

const PARENT: &[&str] = &[
    SCHOOL_READ,
    DISCIPLINE_READ,
    EVENTS_READ,
    EVENTS_CONSENT,
    COMMUNICATION_READ,
    COMMUNICATION_WRITE,
    LISTINGS_READ,
];

const BUSINESS: &[&str] = &[LISTINGS_READ, LISTINGS_WRITE];

/// Permissions granted to `role`. Unknown roles get nothing.
pub fn for_role(role: &str) -> &'static [&'static str] {
    match role {
        ROLE_ADMIN => ALL,
        ROLE_TEACHER => TEACHER,
        ROLE_PARENT => PARENT,
        ROLE_BUSINESS => BUSINESS,
        _ => &[],
    }
}

pub fn is_known_role(role: &str) -> bool {
    matches!(role, ROLE_ADMIN | ROLE_TEACHER | ROLE_PARENT | ROLE_BUSINESS)
}

pub fn role_has(role: &str, permission: &str) -> bool {
    for_role(role).contains(&permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_permission() {
        for permission in ALL {
            assert!(role_has(ROLE_ADMIN, permission), "{permission}");
        }
    }

    #[test]
    fn parents_can_consent_but_not_edit_school_data() {
        assert!(role_has(ROLE_PARENT, EVENTS_CONSENT));
        assert!(role_has(ROLE_PARENT, SCHOOL_READ));
        assert!(!role_has(ROLE_PARENT, SCHOOL_WRITE));
        assert!(!role_has(ROLE_PARENT, DISCIPLINE_WRITE));
    }

    #[test]
    fn business_is_limited_to_listings() {
        assert_eq!(for_role(ROLE_BUSINESS), &[LISTINGS_READ, LISTINGS_WRITE]);
        assert!(!role_has(ROLE_BUSINESS, SCHOOL_READ));
    }

    #[test]
    fn unknown_role_has_no_permissions() {
        assert!(for_role("janitor").is_empty());
        assert!(!is_known_role("janitor"));
    }

    #[test]
    fn only_admins_manage_users() {
        assert!(role_has(ROLE_ADMIN, USERS_MANAGE));
        for role in [ROLE_TEACHER, ROLE_PARENT, ROLE_BUSINESS] {
            assert!(!role_has(role, USERS_MANAGE), "{role}");
        }
    }
}
