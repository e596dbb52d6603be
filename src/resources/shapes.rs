//! Nested object shapes shared by the resources.
//!
//! Each shape comes as a pair: `expand` turns the desired value into the
//! remote input, and its [`Flatten`] impl projects the remote value back,
//! field by field, under the read rules.

use serde::{Deserialize, Serialize};

use crate::api::model;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock};
use crate::value::{flatten_keyed_set, BoolValue, Flatten, Int32Value, ReadRule, Set, SetValue, StringValue, Value};

/// Expand a known set with `f`; null and unknown are omitted.
pub fn expand_set<T, U>(value: &SetValue<T>, f: impl Fn(&T) -> U) -> Option<Vec<U>> {
    value.as_known().map(|items| items.iter().map(f).collect())
}

/// Expand a known set of strings.
pub fn expand_strings(value: &SetValue<String>) -> Option<Vec<String>> {
    expand_set(value, String::clone)
}

/// Expand a known object with `f`.
pub fn expand_object<T, U>(value: &Value<T>, f: impl FnOnce(&T) -> U) -> Option<U> {
    value.as_known().map(f)
}

/// A required field; the planned state was checked by
/// [`validate_planned`](crate::validation::validate_planned) before any
/// expansion runs.
fn required<T: Clone + Default>(value: &Value<T>) -> T {
    value.known_cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// S3 locations and scripts
// ---------------------------------------------------------------------------

/// An object in S3.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct S3LocationModel {
    /// Bucket name.
    pub s3_bucket: StringValue,
    /// Object key.
    pub s3_key: StringValue,
}

impl S3LocationModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("s3_bucket", Attribute::required_string())
            .with_attribute("s3_key", Attribute::optional_string())
    }

    /// Remote input.
    pub fn expand(&self) -> model::S3Location {
        model::S3Location {
            s3_bucket: required(&self.s3_bucket),
            s3_key: self.s3_key.known_cloned(),
        }
    }
}

impl Flatten<model::S3Location> for S3LocationModel {
    fn flatten(remote: &model::S3Location) -> Self {
        Self {
            s3_bucket: Value::known(remote.s3_bucket.clone()),
            s3_key: Value::computed(remote.s3_key.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::S3Location) -> Self {
        Self {
            s3_bucket: Value::known(remote.s3_bucket.clone()),
            s3_key: Value::owned(&prior.s3_key, remote.s3_key.as_ref()),
        }
    }
}

/// A script run while building an application block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptDetailsModel {
    /// Where the script lives.
    pub script_s3_location: Value<S3LocationModel>,
    /// Executable that runs the script.
    pub executable_path: StringValue,
    /// Arguments for the executable.
    pub executable_parameters: StringValue,
    /// Run time limit.
    pub timeout_in_seconds: Int32Value,
}

impl ScriptDetailsModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("executable_path", Attribute::required_string())
            .with_attribute("executable_parameters", Attribute::optional_string())
            .with_attribute("timeout_in_seconds", Attribute::required_int32())
            .with_block(
                "script_s3_location",
                NestedBlock::single(S3LocationModel::block()).with_min_items(1),
            )
    }

    /// Remote input.
    pub fn expand(&self) -> model::ScriptDetails {
        model::ScriptDetails {
            script_s3_location: self
                .script_s3_location
                .as_known()
                .map(S3LocationModel::expand)
                .unwrap_or_default(),
            executable_path: required(&self.executable_path),
            executable_parameters: self.executable_parameters.known_cloned(),
            timeout_in_seconds: required(&self.timeout_in_seconds),
        }
    }
}

impl Flatten<model::ScriptDetails> for ScriptDetailsModel {
    fn flatten(remote: &model::ScriptDetails) -> Self {
        Self {
            script_s3_location: Value::known(S3LocationModel::flatten(&remote.script_s3_location)),
            executable_path: Value::known(remote.executable_path.clone()),
            executable_parameters: Value::computed(remote.executable_parameters.as_ref()),
            timeout_in_seconds: Value::known(remote.timeout_in_seconds),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::ScriptDetails) -> Self {
        Self {
            script_s3_location: Value::owned(&prior.script_s3_location, Some(&remote.script_s3_location)),
            executable_path: Value::known(remote.executable_path.clone()),
            executable_parameters: Value::owned(
                &prior.executable_parameters,
                remote.executable_parameters.as_ref(),
            ),
            timeout_in_seconds: Value::known(remote.timeout_in_seconds),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity error telemetry
// ---------------------------------------------------------------------------

/// An error the service reports on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityErrorModel {
    /// Error code.
    pub error_code: StringValue,
    /// Error message.
    pub error_message: StringValue,
}

impl EntityErrorModel {
    /// Computed attribute holding a list of entity errors.
    pub fn attribute() -> Attribute {
        Attribute::new(
            AttributeType::set(AttributeType::object([
                ("error_code", AttributeType::String),
                ("error_message", AttributeType::String),
            ])),
            AttributeFlags::computed(),
        )
    }
}

impl Flatten<model::EntityError> for EntityErrorModel {
    fn flatten(remote: &model::EntityError) -> Self {
        Self {
            error_code: Value::computed(remote.error_code.as_ref()),
            error_message: Value::computed(remote.error_message.as_ref()),
        }
    }
}

/// Project a remote error list; computed, so always from the remote.
pub fn flatten_errors(remote: Option<&Vec<model::EntityError>>) -> SetValue<EntityErrorModel> {
    Value::from_option(remote.map(|errors| errors.iter().map(EntityErrorModel::flatten).collect()))
}

// ---------------------------------------------------------------------------
// Fleet shapes
// ---------------------------------------------------------------------------

/// Desired and observed fleet capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeCapacityModel {
    /// Desired streaming instances.
    pub desired_instances: Int32Value,
    /// Desired user sessions (multi-session fleets).
    pub desired_sessions: Int32Value,
    /// Instances available for streaming.
    pub available: Int32Value,
    /// Instances in use.
    pub in_use: Int32Value,
    /// Instances running.
    pub running: Int32Value,
}

impl ComputeCapacityModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("desired_instances", Attribute::optional_int32())
            .with_attribute("desired_sessions", Attribute::optional_int32())
            .with_attribute("available", Attribute::computed_int32())
            .with_attribute("in_use", Attribute::computed_int32())
            .with_attribute("running", Attribute::computed_int32())
    }

    /// Remote input.
    pub fn expand(&self) -> model::ComputeCapacity {
        model::ComputeCapacity {
            desired_instances: self.desired_instances.known_cloned(),
            desired_sessions: self.desired_sessions.known_cloned(),
        }
    }
}

impl Flatten<model::ComputeCapacityStatus> for ComputeCapacityModel {
    fn flatten(remote: &model::ComputeCapacityStatus) -> Self {
        Self {
            desired_instances: Value::computed(remote.desired.as_ref()),
            desired_sessions: Value::computed(remote.desired_user_sessions.as_ref()),
            available: Value::computed(remote.available.as_ref()),
            in_use: Value::computed(remote.in_use.as_ref()),
            running: Value::computed(remote.running.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::ComputeCapacityStatus) -> Self {
        Self {
            desired_instances: Value::owned(&prior.desired_instances, remote.desired.as_ref()),
            desired_sessions: Value::owned(&prior.desired_sessions, remote.desired_user_sessions.as_ref()),
            ..Self::flatten(remote)
        }
    }
}

/// Network placement of a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VpcConfigModel {
    /// Subnets.
    pub subnet_ids: SetValue<String>,
    /// Security groups.
    pub security_group_ids: SetValue<String>,
}

impl VpcConfigModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("subnet_ids", Attribute::string_set(AttributeFlags::optional()))
            .with_attribute("security_group_ids", Attribute::string_set(AttributeFlags::optional()))
    }

    /// Remote input.
    pub fn expand(&self) -> model::VpcConfig {
        model::VpcConfig {
            subnet_ids: expand_strings(&self.subnet_ids),
            security_group_ids: expand_strings(&self.security_group_ids),
        }
    }
}

impl Flatten<model::VpcConfig> for VpcConfigModel {
    fn flatten(remote: &model::VpcConfig) -> Self {
        Self {
            subnet_ids: Value::computed(remote.subnet_ids.as_ref()),
            security_group_ids: Value::computed(remote.security_group_ids.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::VpcConfig) -> Self {
        Self {
            subnet_ids: Value::owned(&prior.subnet_ids, remote.subnet_ids.as_ref()),
            security_group_ids: Value::owned(&prior.security_group_ids, remote.security_group_ids.as_ref()),
        }
    }
}

/// Active Directory join settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainJoinInfoModel {
    /// Fully qualified directory name.
    pub directory_name: StringValue,
    /// OU for computer accounts.
    pub organizational_unit_distinguished_name: StringValue,
}

impl DomainJoinInfoModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("directory_name", Attribute::optional_string())
            .with_attribute("organizational_unit_distinguished_name", Attribute::optional_string())
    }

    /// Remote input.
    pub fn expand(&self) -> model::DomainJoinInfo {
        model::DomainJoinInfo {
            directory_name: self.directory_name.known_cloned(),
            organizational_unit_distinguished_name: self.organizational_unit_distinguished_name.known_cloned(),
        }
    }
}

impl Flatten<model::DomainJoinInfo> for DomainJoinInfoModel {
    fn flatten(remote: &model::DomainJoinInfo) -> Self {
        Self {
            directory_name: Value::computed(remote.directory_name.as_ref()),
            organizational_unit_distinguished_name: Value::computed(
                remote.organizational_unit_distinguished_name.as_ref(),
            ),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::DomainJoinInfo) -> Self {
        Self {
            directory_name: Value::owned(&prior.directory_name, remote.directory_name.as_ref()),
            organizational_unit_distinguished_name: Value::owned(
                &prior.organizational_unit_distinguished_name,
                remote.organizational_unit_distinguished_name.as_ref(),
            ),
        }
    }
}

/// Root volume settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfigModel {
    /// Volume size in GiB.
    pub volume_size_in_gb: Int32Value,
}

impl VolumeConfigModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new().with_attribute("volume_size_in_gb", Attribute::optional_computed_int32())
    }

    /// Remote input.
    pub fn expand(&self) -> model::VolumeConfig {
        model::VolumeConfig {
            volume_size_in_gb: self.volume_size_in_gb.known_cloned(),
        }
    }
}

impl Flatten<model::VolumeConfig> for VolumeConfigModel {
    fn flatten(remote: &model::VolumeConfig) -> Self {
        Self {
            volume_size_in_gb: Value::computed(remote.volume_size_in_gb.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::VolumeConfig) -> Self {
        Self {
            volume_size_in_gb: Value::computed_optional(&prior.volume_size_in_gb, remote.volume_size_in_gb.as_ref()),
        }
    }
}

// ---------------------------------------------------------------------------
// Stack shapes
// ---------------------------------------------------------------------------

/// Storage connector types.
pub const CONNECTOR_TYPES: &[&str] = &["HOMEFOLDERS", "GOOGLE_DRIVE", "ONE_DRIVE"];

/// A stack storage connector, keyed by `connector_type`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConnectorModel {
    /// Connector type.
    pub connector_type: StringValue,
    /// ARN of the storage resource.
    pub resource_identifier: StringValue,
    /// Domains allowed to use the connector.
    pub domains: SetValue<String>,
    /// OneDrive domains that require admin consent.
    pub domains_require_admin_consent: SetValue<String>,
}

impl StorageConnectorModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("connector_type", Attribute::required_string())
            .with_attribute("resource_identifier", Attribute::optional_string())
            .with_attribute("domains", Attribute::string_set(AttributeFlags::optional()))
            .with_attribute(
                "domains_require_admin_consent",
                Attribute::string_set(AttributeFlags::optional()),
            )
    }

    /// Remote input.
    pub fn expand(&self) -> model::StorageConnector {
        model::StorageConnector {
            connector_type: required(&self.connector_type),
            resource_identifier: self.resource_identifier.known_cloned(),
            domains: expand_strings(&self.domains),
            domains_require_admin_consent: expand_strings(&self.domains_require_admin_consent),
        }
    }

    /// Read a connector set keyed by connector type.
    pub fn read_set(
        rule: ReadRule,
        prior: &SetValue<Self>,
        remote: Option<&[model::StorageConnector]>,
    ) -> SetValue<Self> {
        flatten_keyed_set(
            rule,
            prior,
            remote,
            |c: &Self| c.connector_type.known_cloned(),
            |r: &model::StorageConnector| r.connector_type.clone(),
            |c: &Self| Self {
                connector_type: c.connector_type.clone(),
                ..Self::default()
            },
        )
    }
}

impl Flatten<model::StorageConnector> for StorageConnectorModel {
    fn flatten(remote: &model::StorageConnector) -> Self {
        Self {
            connector_type: Value::known(remote.connector_type.clone()),
            resource_identifier: Value::computed(remote.resource_identifier.as_ref()),
            domains: Value::computed(remote.domains.as_ref()),
            domains_require_admin_consent: Value::computed(remote.domains_require_admin_consent.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::StorageConnector) -> Self {
        Self {
            connector_type: Value::known(remote.connector_type.clone()),
            resource_identifier: Value::owned(&prior.resource_identifier, remote.resource_identifier.as_ref()),
            domains: Value::owned(&prior.domains, remote.domains.as_ref()),
            domains_require_admin_consent: Value::owned(
                &prior.domains_require_admin_consent,
                remote.domains_require_admin_consent.as_ref(),
            ),
        }
    }
}

/// User setting actions.
pub const USER_SETTING_ACTIONS: &[&str] = &[
    "CLIPBOARD_COPY_FROM_LOCAL_DEVICE",
    "CLIPBOARD_COPY_TO_LOCAL_DEVICE",
    "FILE_UPLOAD",
    "FILE_DOWNLOAD",
    "PRINTING_TO_LOCAL_DEVICE",
    "DOMAIN_PASSWORD_SIGNIN",
    "DOMAIN_SMART_CARD_SIGNIN",
    "AUTO_TIME_ZONE_REDIRECTION",
];

/// Actions that accept `maximum_length`.
pub const CLIPBOARD_ACTIONS: &[&str] = &["CLIPBOARD_COPY_FROM_LOCAL_DEVICE", "CLIPBOARD_COPY_TO_LOCAL_DEVICE"];

/// Permission values.
pub const PERMISSIONS: &[&str] = &["ENABLED", "DISABLED"];

/// A streaming-user permission, keyed by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettingModel {
    /// Action.
    pub action: StringValue,
    /// `ENABLED` or `DISABLED`.
    pub permission: StringValue,
    /// Clipboard size limit.
    pub maximum_length: Int32Value,
}

impl UserSettingModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("action", Attribute::required_string())
            .with_attribute("permission", Attribute::required_string())
            .with_attribute("maximum_length", Attribute::optional_int32())
    }

    /// Remote input.
    pub fn expand(&self) -> model::UserSetting {
        model::UserSetting {
            action: required(&self.action),
            permission: required(&self.permission),
            maximum_length: self.maximum_length.known_cloned(),
        }
    }

    /// Read a user setting set keyed by action.
    pub fn read_set(rule: ReadRule, prior: &SetValue<Self>, remote: Option<&[model::UserSetting]>) -> SetValue<Self> {
        flatten_keyed_set(
            rule,
            prior,
            remote,
            |s: &Self| s.action.known_cloned(),
            |r: &model::UserSetting| r.action.clone(),
            |s: &Self| Self {
                action: s.action.clone(),
                ..Self::default()
            },
        )
    }
}

impl Flatten<model::UserSetting> for UserSettingModel {
    fn flatten(remote: &model::UserSetting) -> Self {
        Self {
            action: Value::known(remote.action.clone()),
            permission: Value::known(remote.permission.clone()),
            maximum_length: Value::computed(remote.maximum_length.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::UserSetting) -> Self {
        Self {
            maximum_length: Value::owned(&prior.maximum_length, remote.maximum_length.as_ref()),
            ..Self::flatten(remote)
        }
    }
}

/// Application settings persistence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettingsModel {
    /// Whether settings persist between sessions.
    pub enabled: BoolValue,
    /// Settings group.
    pub settings_group: StringValue,
    /// Bucket where settings are stored.
    pub s3_bucket_name: StringValue,
}

impl ApplicationSettingsModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("enabled", Attribute::required_bool())
            .with_attribute("settings_group", Attribute::optional_string())
            .with_attribute("s3_bucket_name", Attribute::computed_string())
    }

    /// Remote input.
    pub fn expand(&self) -> model::ApplicationSettings {
        model::ApplicationSettings {
            enabled: self.enabled.known_cloned().unwrap_or(false),
            settings_group: self.settings_group.known_cloned(),
        }
    }
}

impl Flatten<model::ApplicationSettingsResponse> for ApplicationSettingsModel {
    fn flatten(remote: &model::ApplicationSettingsResponse) -> Self {
        Self {
            enabled: Value::computed(remote.enabled.as_ref()),
            settings_group: Value::computed(remote.settings_group.as_ref()),
            s3_bucket_name: Value::computed(remote.s3_bucket_name.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::ApplicationSettingsResponse) -> Self {
        Self {
            enabled: Value::owned(&prior.enabled, remote.enabled.as_ref()),
            settings_group: Value::owned(&prior.settings_group, remote.settings_group.as_ref()),
            s3_bucket_name: Value::computed(remote.s3_bucket_name.as_ref()),
        }
    }
}

/// An interface VPC endpoint allowed to reach a stack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessEndpointModel {
    /// Endpoint type, `STREAMING`.
    pub endpoint_type: StringValue,
    /// Endpoint ID.
    pub vpce_id: StringValue,
}

impl AccessEndpointModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("endpoint_type", Attribute::required_string())
            .with_attribute("vpce_id", Attribute::optional_string())
    }

    /// Remote input.
    pub fn expand(&self) -> model::AccessEndpoint {
        model::AccessEndpoint {
            endpoint_type: required(&self.endpoint_type),
            vpce_id: self.vpce_id.known_cloned(),
        }
    }

    /// Read an endpoint set keyed by type and endpoint ID.
    pub fn read_set(
        rule: ReadRule,
        prior: &SetValue<Self>,
        remote: Option<&[model::AccessEndpoint]>,
    ) -> SetValue<Self> {
        flatten_keyed_set(
            rule,
            prior,
            remote,
            |e: &Self| Some((e.endpoint_type.known_cloned()?, e.vpce_id.known_cloned())),
            |r: &model::AccessEndpoint| (r.endpoint_type.clone(), r.vpce_id.clone()),
            |e: &Self| Self {
                endpoint_type: e.endpoint_type.clone(),
                vpce_id: Value::Null,
            },
        )
    }
}

impl Flatten<model::AccessEndpoint> for AccessEndpointModel {
    fn flatten(remote: &model::AccessEndpoint) -> Self {
        Self {
            endpoint_type: Value::known(remote.endpoint_type.clone()),
            vpce_id: Value::computed(remote.vpce_id.as_ref()),
        }
    }
}

/// Streaming protocol preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingExperienceSettingsModel {
    /// `TCP` or `UDP`.
    pub preferred_protocol: StringValue,
}

impl StreamingExperienceSettingsModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new().with_attribute("preferred_protocol", Attribute::optional_string())
    }

    /// Remote input.
    pub fn expand(&self) -> model::StreamingExperienceSettings {
        model::StreamingExperienceSettings {
            preferred_protocol: self.preferred_protocol.known_cloned(),
        }
    }
}

impl Flatten<model::StreamingExperienceSettings> for StreamingExperienceSettingsModel {
    fn flatten(remote: &model::StreamingExperienceSettings) -> Self {
        Self {
            preferred_protocol: Value::computed(remote.preferred_protocol.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::StreamingExperienceSettings) -> Self {
        Self {
            preferred_protocol: Value::owned(&prior.preferred_protocol, remote.preferred_protocol.as_ref()),
        }
    }
}

// ---------------------------------------------------------------------------
// Directory config shapes
// ---------------------------------------------------------------------------

/// Directory service account. Accepted on input only.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccountCredentialsModel {
    /// Account name, `DOMAIN\user`.
    pub account_name: StringValue,
    /// Account password.
    pub account_password: StringValue,
}

impl std::fmt::Debug for ServiceAccountCredentialsModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentialsModel")
            .field("account_name", &self.account_name)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountCredentialsModel {
    /// Write-only object attribute.
    pub fn attribute() -> Attribute {
        Attribute::new(
            AttributeType::object([
                ("account_name", AttributeType::String),
                ("account_password", AttributeType::String),
            ]),
            AttributeFlags::optional(),
        )
        .sensitive()
        .write_only()
    }

    /// Remote input, if both fields are known.
    pub fn expand(&self) -> Option<model::ServiceAccountCredentials> {
        Some(model::ServiceAccountCredentials {
            account_name: self.account_name.known_cloned()?,
            account_password: self.account_password.known_cloned()?,
        })
    }
}

/// Certificate status values.
pub const CERTIFICATE_STATUSES: &[&str] = &["DISABLED", "ENABLED", "ENABLED_NO_DIRECTORY_LOGIN_FALLBACK"];

/// Certificate-based authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateBasedAuthModel {
    /// Status.
    pub status: StringValue,
    /// ARN of the private certificate authority.
    pub certificate_authority_arn: StringValue,
}

impl CertificateBasedAuthModel {
    /// Schema block.
    pub fn block() -> Block {
        Block::new()
            .with_attribute("status", Attribute::optional_string())
            .with_attribute("certificate_authority_arn", Attribute::optional_string())
    }

    /// Remote input.
    pub fn expand(&self) -> model::CertificateBasedAuthProperties {
        model::CertificateBasedAuthProperties {
            status: self.status.known_cloned(),
            certificate_authority_arn: self.certificate_authority_arn.known_cloned(),
        }
    }
}

impl Flatten<model::CertificateBasedAuthProperties> for CertificateBasedAuthModel {
    fn flatten(remote: &model::CertificateBasedAuthProperties) -> Self {
        Self {
            status: Value::computed(remote.status.as_ref()),
            certificate_authority_arn: Value::computed(remote.certificate_authority_arn.as_ref()),
        }
    }

    fn flatten_owned(prior: &Self, remote: &model::CertificateBasedAuthProperties) -> Self {
        Self {
            status: Value::owned(&prior.status, remote.status.as_ref()),
            certificate_authority_arn: Value::owned(
                &prior.certificate_authority_arn,
                remote.certificate_authority_arn.as_ref(),
            ),
        }
    }
}

/// Streaming instance platforms.
pub const PLATFORMS: &[&str] = &[
    "WINDOWS",
    "WINDOWS_SERVER_2016",
    "WINDOWS_SERVER_2019",
    "WINDOWS_SERVER_2022",
    "AMAZON_LINUX2",
    "RHEL8",
    "ROCKY_LINUX8",
];

/// Build a set from string slices.
pub fn string_set(items: &[&str]) -> SetValue<String> {
    Value::Known(items.iter().map(|s| s.to_string()).collect::<Set<String>>())
}
