//! Shapes exchanged with the remote streaming API.
//!
//! These mirror the service's request and response structures. Optional
//! remote fields are `Option`; the engine turns them into tri-state values
//! with the read rules in [`crate::value`].

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Remote timestamp.
pub type Timestamp = DateTime<Utc>;

/// Tag set keyed by tag name.
pub type Tags = BTreeMap<String, String>;

/// Location of an object in S3.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct S3Location {
    /// Bucket name.
    pub s3_bucket: String,
    /// Object key; optional for some packaging types.
    pub s3_key: Option<String>,
}

/// A script run while building an application block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptDetails {
    /// Where the script lives.
    pub script_s3_location: S3Location,
    /// Path of the executable that runs the script.
    pub executable_path: String,
    /// Arguments for the executable.
    pub executable_parameters: Option<String>,
    /// Run time limit.
    pub timeout_in_seconds: i32,
}

/// An error reported on an entity by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityError {
    /// Error code.
    pub error_code: Option<String>,
    /// Error message.
    pub error_message: Option<String>,
}

/// Application block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppBlock {
    pub name: String,
    pub arn: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub source_s3_location: Option<S3Location>,
    pub setup_script_details: Option<ScriptDetails>,
    pub post_setup_script_details: Option<ScriptDetails>,
    pub packaging_type: Option<String>,
    pub state: Option<String>,
    pub created_time: Option<Timestamp>,
    pub app_block_errors: Option<Vec<EntityError>>,
}

/// Input of `CreateAppBlock`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateAppBlockInput {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub source_s3_location: S3Location,
    pub setup_script_details: Option<ScriptDetails>,
    pub post_setup_script_details: Option<ScriptDetails>,
    pub packaging_type: Option<String>,
}

/// Application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Application {
    pub name: String,
    pub arn: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon_s3_location: Option<S3Location>,
    pub icon_url: Option<String>,
    pub launch_path: Option<String>,
    pub working_directory: Option<String>,
    pub launch_parameters: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub instance_families: Option<Vec<String>>,
    pub app_block_arn: Option<String>,
    pub enabled: Option<bool>,
    pub created_time: Option<Timestamp>,
}

/// Input of `CreateApplication`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateApplicationInput {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon_s3_location: S3Location,
    pub launch_path: String,
    pub working_directory: Option<String>,
    pub launch_parameters: Option<String>,
    pub platforms: Vec<String>,
    pub instance_families: Vec<String>,
    pub app_block_arn: String,
}

/// Input of `UpdateApplication`. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateApplicationInput {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub icon_s3_location: Option<S3Location>,
    pub launch_path: Option<String>,
    pub working_directory: Option<String>,
    pub launch_parameters: Option<String>,
    pub app_block_arn: Option<String>,
    pub attributes_to_delete: Vec<ApplicationAttribute>,
}

/// Fleet lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FleetState {
    Starting,
    Running,
    Stopping,
    #[default]
    Stopped,
}

impl FleetState {
    /// Remote name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for FleetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested fleet capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComputeCapacity {
    pub desired_instances: Option<i32>,
    pub desired_sessions: Option<i32>,
}

/// Observed fleet capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComputeCapacityStatus {
    pub desired: Option<i32>,
    pub running: Option<i32>,
    pub in_use: Option<i32>,
    pub available: Option<i32>,
    pub desired_user_sessions: Option<i32>,
    pub active_user_sessions: Option<i32>,
    pub actual_user_sessions: Option<i32>,
    pub available_user_sessions: Option<i32>,
}

/// Network placement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VpcConfig {
    pub subnet_ids: Option<Vec<String>>,
    pub security_group_ids: Option<Vec<String>>,
}

/// Active Directory join settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainJoinInfo {
    pub directory_name: Option<String>,
    pub organizational_unit_distinguished_name: Option<String>,
}

/// Root volume settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VolumeConfig {
    pub volume_size_in_gb: Option<i32>,
}

/// Fleet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fleet {
    pub name: String,
    pub arn: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub image_name: Option<String>,
    pub image_arn: Option<String>,
    pub instance_type: String,
    pub fleet_type: Option<String>,
    pub compute_capacity_status: Option<ComputeCapacityStatus>,
    pub max_user_duration_in_seconds: Option<i32>,
    pub disconnect_timeout_in_seconds: Option<i32>,
    pub idle_disconnect_timeout_in_seconds: Option<i32>,
    pub state: FleetState,
    pub vpc_config: Option<VpcConfig>,
    pub created_time: Option<Timestamp>,
    pub fleet_errors: Option<Vec<EntityError>>,
    pub enable_default_internet_access: Option<bool>,
    pub domain_join_info: Option<DomainJoinInfo>,
    pub iam_role_arn: Option<String>,
    pub stream_view: Option<String>,
    pub platform: Option<String>,
    pub max_concurrent_sessions: Option<i32>,
    pub usb_device_filter_strings: Option<Vec<String>>,
    pub session_script_s3_location: Option<S3Location>,
    pub max_sessions_per_instance: Option<i32>,
    pub root_volume_config: Option<VolumeConfig>,
}

/// Input of `CreateFleet`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateFleetInput {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub image_name: Option<String>,
    pub image_arn: Option<String>,
    pub instance_type: String,
    pub fleet_type: Option<String>,
    pub compute_capacity: Option<ComputeCapacity>,
    pub max_user_duration_in_seconds: Option<i32>,
    pub disconnect_timeout_in_seconds: Option<i32>,
    pub idle_disconnect_timeout_in_seconds: Option<i32>,
    pub vpc_config: Option<VpcConfig>,
    pub enable_default_internet_access: Option<bool>,
    pub domain_join_info: Option<DomainJoinInfo>,
    pub iam_role_arn: Option<String>,
    pub stream_view: Option<String>,
    pub platform: Option<String>,
    pub max_concurrent_sessions: Option<i32>,
    pub usb_device_filter_strings: Option<Vec<String>>,
    pub session_script_s3_location: Option<S3Location>,
    pub max_sessions_per_instance: Option<i32>,
    pub root_volume_config: Option<VolumeConfig>,
}

/// Input of `UpdateFleet`. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateFleetInput {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub image_name: Option<String>,
    pub image_arn: Option<String>,
    pub instance_type: Option<String>,
    pub compute_capacity: Option<ComputeCapacity>,
    pub max_user_duration_in_seconds: Option<i32>,
    pub disconnect_timeout_in_seconds: Option<i32>,
    pub idle_disconnect_timeout_in_seconds: Option<i32>,
    pub vpc_config: Option<VpcConfig>,
    pub enable_default_internet_access: Option<bool>,
    pub domain_join_info: Option<DomainJoinInfo>,
    pub iam_role_arn: Option<String>,
    pub stream_view: Option<String>,
    pub platform: Option<String>,
    pub max_concurrent_sessions: Option<i32>,
    pub usb_device_filter_strings: Option<Vec<String>>,
    pub session_script_s3_location: Option<S3Location>,
    pub max_sessions_per_instance: Option<i32>,
    pub root_volume_config: Option<VolumeConfig>,
    pub attributes_to_delete: Vec<FleetAttribute>,
}

/// Storage connector of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageConnector {
    pub connector_type: String,
    pub resource_identifier: Option<String>,
    pub domains: Option<Vec<String>>,
    pub domains_require_admin_consent: Option<Vec<String>>,
}

/// Action permission for streaming users.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserSetting {
    pub action: String,
    pub permission: String,
    pub maximum_length: Option<i32>,
}

/// Application settings persistence, as sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationSettings {
    pub enabled: bool,
    pub settings_group: Option<String>,
}

/// Application settings persistence, as returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationSettingsResponse {
    pub enabled: Option<bool>,
    pub settings_group: Option<String>,
    pub s3_bucket_name: Option<String>,
}

/// Interface VPC endpoint allowed to reach the stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessEndpoint {
    pub endpoint_type: String,
    pub vpce_id: Option<String>,
}

/// Streaming protocol preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamingExperienceSettings {
    pub preferred_protocol: Option<String>,
}

/// Stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stack {
    pub name: String,
    pub arn: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub storage_connectors: Option<Vec<StorageConnector>>,
    pub redirect_url: Option<String>,
    pub feedback_url: Option<String>,
    pub user_settings: Option<Vec<UserSetting>>,
    pub application_settings: Option<ApplicationSettingsResponse>,
    pub access_endpoints: Option<Vec<AccessEndpoint>>,
    pub embed_host_domains: Option<Vec<String>>,
    pub streaming_experience_settings: Option<StreamingExperienceSettings>,
    pub stack_errors: Option<Vec<EntityError>>,
    pub created_time: Option<Timestamp>,
}

/// Input of `CreateStack`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateStackInput {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub storage_connectors: Option<Vec<StorageConnector>>,
    pub redirect_url: Option<String>,
    pub feedback_url: Option<String>,
    pub user_settings: Option<Vec<UserSetting>>,
    pub application_settings: Option<ApplicationSettings>,
    pub access_endpoints: Option<Vec<AccessEndpoint>>,
    pub embed_host_domains: Option<Vec<String>>,
    pub streaming_experience_settings: Option<StreamingExperienceSettings>,
}

/// Input of `UpdateStack`. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateStackInput {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub storage_connectors: Option<Vec<StorageConnector>>,
    pub redirect_url: Option<String>,
    pub feedback_url: Option<String>,
    pub user_settings: Option<Vec<UserSetting>>,
    pub application_settings: Option<ApplicationSettings>,
    pub access_endpoints: Option<Vec<AccessEndpoint>>,
    pub embed_host_domains: Option<Vec<String>>,
    pub streaming_experience_settings: Option<StreamingExperienceSettings>,
    pub attributes_to_delete: Vec<StackAttribute>,
}

/// Credentials of the directory service account.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ServiceAccountCredentials {
    pub account_name: String,
    pub account_password: String,
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("account_name", &self.account_name)
            .field("account_password", &"<redacted>")
            .finish()
    }
}

/// Certificate-based authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertificateBasedAuthProperties {
    pub status: Option<String>,
    pub certificate_authority_arn: Option<String>,
}

/// Directory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryConfig {
    pub directory_name: String,
    pub organizational_unit_distinguished_names: Option<Vec<String>>,
    pub service_account_credentials: Option<ServiceAccountCredentials>,
    pub certificate_based_auth_properties: Option<CertificateBasedAuthProperties>,
    pub created_time: Option<Timestamp>,
}

/// Input of `CreateDirectoryConfig` and `UpdateDirectoryConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryConfigInput {
    pub directory_name: String,
    pub organizational_unit_distinguished_names: Option<Vec<String>>,
    pub service_account_credentials: Option<ServiceAccountCredentials>,
    pub certificate_based_auth_properties: Option<CertificateBasedAuthProperties>,
}

/// An application attached to a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationFleetAssociation {
    pub fleet_name: String,
    pub application_arn: String,
}

/// A user entitled to a stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserStackAssociation {
    pub stack_name: String,
    pub user_name: String,
    pub authentication_type: String,
    pub send_email_notification: Option<bool>,
}

/// Per-item failure of a batch user-stack call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserStackAssociationError {
    pub user_stack_association: UserStackAssociation,
    pub error_code: String,
    pub error_message: Option<String>,
}

/// An application granted by an entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntitledApplication {
    pub application_identifier: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

macro_rules! deletion_tokens {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                #[doc = concat!("`", $token, "`")]
                $variant,
            )+
        }

        impl $name {
            /// Remote name of the token.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

deletion_tokens! {
    /// Application attributes that can be cleared on update.
    ApplicationAttribute {
        LaunchParameters => "LAUNCH_PARAMETERS",
        WorkingDirectory => "WORKING_DIRECTORY",
        Description => "DESCRIPTION",
        DisplayName => "DISPLAY_NAME",
    }
}

deletion_tokens! {
    /// Fleet attributes that can be cleared on update.
    FleetAttribute {
        VpcConfiguration => "VPC_CONFIGURATION",
        VpcConfigurationSecurityGroupIds => "VPC_CONFIGURATION_SECURITY_GROUP_IDS",
        DomainJoinInfo => "DOMAIN_JOIN_INFO",
        IamRoleArn => "IAM_ROLE_ARN",
        UsbDeviceFilterStrings => "USB_DEVICE_FILTER_STRINGS",
        SessionScriptS3Location => "SESSION_SCRIPT_S3_LOCATION",
        MaxSessionsPerInstance => "MAX_SESSIONS_PER_INSTANCE",
        Description => "DESCRIPTION",
        DisplayName => "DISPLAY_NAME",
    }
}

deletion_tokens! {
    /// Stack attributes that can be cleared on update.
    StackAttribute {
        StorageConnectors => "STORAGE_CONNECTORS",
        StorageConnectorHomefolders => "STORAGE_CONNECTOR_HOMEFOLDERS",
        StorageConnectorGoogleDrive => "STORAGE_CONNECTOR_GOOGLE_DRIVE",
        StorageConnectorOneDrive => "STORAGE_CONNECTOR_ONE_DRIVE",
        RedirectUrl => "REDIRECT_URL",
        FeedbackUrl => "FEEDBACK_URL",
        UserSettings => "USER_SETTINGS",
        EmbedHostDomains => "EMBED_HOST_DOMAINS",
        AccessEndpoints => "ACCESS_ENDPOINTS",
        StreamingExperienceSettings => "STREAMING_EXPERIENCE_SETTINGS",
        Description => "DESCRIPTION",
        DisplayName => "DISPLAY_NAME",
    }
}

impl StackAttribute {
    /// Element-level token for a storage connector type.
    pub fn for_connector(connector_type: &str) -> Option<Self> {
        match connector_type {
            "HOMEFOLDERS" => Some(Self::StorageConnectorHomefolders),
            "GOOGLE_DRIVE" => Some(Self::StorageConnectorGoogleDrive),
            "ONE_DRIVE" => Some(Self::StorageConnectorOneDrive),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_names() {
        assert_eq!(StackAttribute::RedirectUrl.as_str(), "REDIRECT_URL");
        assert_eq!(
            FleetAttribute::VpcConfigurationSecurityGroupIds.to_string(),
            "VPC_CONFIGURATION_SECURITY_GROUP_IDS"
        );
        assert_eq!(ApplicationAttribute::LaunchParameters.as_str(), "LAUNCH_PARAMETERS");
    }

    #[test]
    fn test_connector_tokens() {
        assert_eq!(
            StackAttribute::for_connector("ONE_DRIVE"),
            Some(StackAttribute::StorageConnectorOneDrive)
        );
        assert_eq!(StackAttribute::for_connector("DROPBOX"), None);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = ServiceAccountCredentials {
            account_name: "CORP\\svc".to_string(),
            account_password: "hunter2".to_string(),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("svc"));
        assert!(!printed.contains("hunter2"));
    }
}
