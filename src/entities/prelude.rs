pub use super::activity_group::Entity as ActivityGroup;
pub use super::age_group::Entity as AgeGroup;
pub use super::business_listing::Entity as BusinessListing;
pub use super::contact_number::Entity as ContactNumber;
pub use super::disciplinary_action::Entity as DisciplinaryAction;
pub use super::disciplinary_incident::Entity as DisciplinaryIncident;
pub use super::email_address::Entity as EmailAddress;
pub use super::emergency_contact::Entity as EmergencyContact;
pub use super::learner::Entity as Learner;
pub use super::learner_parent::Entity as LearnerParent;
pub use super::listing_image::Entity as ListingImage;
pub use super::listing_product::Entity as ListingProduct;
pub use super::listing_service::Entity as ListingService;
pub use super::listing_tier::Entity as ListingTier;
pub use super::message::Entity as Message;
pub use super::notification::Entity as Notification;
pub use super::parent::Entity as Parent;
pub use super::parent_address::Entity as ParentAddress;
pub use super::parent_permission::Entity as ParentPermission;
pub use super::participating_activity_group::Entity as ParticipatingActivityGroup;
pub use super::school_event::Entity as SchoolEvent;
pub use super::school_grade::Entity as SchoolGrade;
pub use super::severity_scale::Entity as SeverityScale;
pub use super::teacher::Entity as Teacher;
pub use super::user::Entity as User;
pub use super::user_token::Entity as UserToken;
