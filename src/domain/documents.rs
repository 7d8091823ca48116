//! Signup document requirements per account role.

use super::profile::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequiredDocument {
    /// Stable key used for upload slots and stored file paths.
    pub code: &'static str,
    pub label: &'static str,
    pub mandatory: bool,
}

const CUSTOMER_DOCUMENTS: &[RequiredDocument] = &[RequiredDocument {
    code: "nrc",
    label: "National Registration Card",
    mandatory: true,
}];

const STAFF_DOCUMENTS: &[RequiredDocument] = &[
    RequiredDocument {
        code: "nrc",
        label: "National Registration Card",
        mandatory: true,
    },
    RequiredDocument {
        code: "employment_letter",
        label: "Employment letter",
        mandatory: true,
    },
    RequiredDocument {
        code: "police_clearance",
        label: "Police clearance",
        mandatory: false,
    },
];

const ADMIN_DOCUMENTS: &[RequiredDocument] = &[
    RequiredDocument {
        code: "nrc",
        label: "National Registration Card",
        mandatory: true,
    },
    RequiredDocument {
        code: "employment_letter",
        label: "Employment letter",
        mandatory: true,
    },
    RequiredDocument {
        code: "authorization_letter",
        label: "Authorization letter",
        mandatory: true,
    },
];

/// Documents a signup of the given role must provide. Unknown roles fall back
/// to the customer baseline, mirroring the defaulted-profile behavior.
pub fn required_documents(role: &Role) -> &'static [RequiredDocument] {
    match role {
        Role::Customer | Role::Unknown(_) => CUSTOMER_DOCUMENTS,
        Role::Staff => STAFF_DOCUMENTS,
        Role::Admin => ADMIN_DOCUMENTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_requires_the_national_id() {
        for role in [
            Role::Customer,
            Role::Staff,
            Role::Admin,
            Role::Unknown("dispatcher".to_string()),
        ] {
            let documents = required_documents(&role);
            assert!(
                documents.iter().any(|d| d.code == "nrc" && d.mandatory),
                "role {role} is missing the mandatory national id"
            );
        }
    }

    #[test]
    fn staff_roles_require_an_employment_letter() {
        for role in [Role::Staff, Role::Admin] {
            assert!(required_documents(&role)
                .iter()
                .any(|d| d.code == "employment_letter" && d.mandatory));
        }
        assert!(!required_documents(&Role::Customer)
            .iter()
            .any(|d| d.code == "employment_letter"));
    }

    #[test]
    fn unknown_roles_fall_back_to_the_customer_baseline() {
        assert_eq!(
            required_documents(&Role::Unknown("dispatcher".to_string())),
            required_documents(&Role::Customer)
        );
    }
}
