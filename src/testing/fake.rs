//! In-memory implementation of the remote API.
//!
//! [`FakeAppStream`] keeps every entity in a map, records each call, and can
//! be told to fail upcoming calls. Two eventual-consistency behaviours of the
//! real service are reproduced: fleets move through `STARTING`/`STOPPING`
//! and settle one describe later, and batch user-stack calls report
//! `STACK_NOT_FOUND` per item while the stack does not exist.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::DateTime;

use crate::api::model::*;
use crate::api::{codes, ApiError, ApiResult, AppStreamApi};

const ARN_PREFIX: &str = "arn:aws:appstream:us-east-1:123456789012";

/// ARN the fake assigns to an entity of `kind` named `name`.
pub fn fake_arn(kind: &str, name: &str) -> String {
    format!("{ARN_PREFIX}:{kind}/{name}")
}

/// Creation time the fake stamps on every entity.
pub const CREATED_TIME: &str = "2024-01-01T00:00:00Z";

fn created_time() -> Option<Timestamp> {
    DateTime::from_timestamp(1_704_067_200, 0)
}

/// A recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Call {
    CreateAppBlock(CreateAppBlockInput),
    DescribeAppBlock { arn: String },
    DeleteAppBlock { name: String },
    CreateApplication(CreateApplicationInput),
    DescribeApplication { arn: String },
    UpdateApplication(UpdateApplicationInput),
    DeleteApplication { name: String },
    CreateFleet(CreateFleetInput),
    DescribeFleet { name: String },
    UpdateFleet(UpdateFleetInput),
    DeleteFleet { name: String },
    StartFleet { name: String },
    StopFleet { name: String },
    CreateStack(CreateStackInput),
    DescribeStack { name: String },
    UpdateStack(UpdateStackInput),
    DeleteStack { name: String },
    CreateDirectoryConfig(DirectoryConfigInput),
    DescribeDirectoryConfig { name: String },
    UpdateDirectoryConfig(DirectoryConfigInput),
    DeleteDirectoryConfig { name: String },
    AssociateFleet { fleet: String, stack: String },
    DisassociateFleet { fleet: String, stack: String },
    ListAssociatedStacks { fleet: String },
    AssociateApplicationFleet { fleet: String, application_arn: String },
    DisassociateApplicationFleet { fleet: String, application_arn: String },
    DescribeApplicationFleetAssociations,
    BatchAssociateUserStack(Vec<UserStackAssociation>),
    BatchDisassociateUserStack(Vec<UserStackAssociation>),
    DescribeUserStackAssociations,
    AssociateApplicationToEntitlement { stack: String, entitlement: String, application: String },
    DisassociateApplicationFromEntitlement { stack: String, entitlement: String, application: String },
    ListEntitledApplications { stack: String, entitlement: String },
    ListTagsForResource { arn: String },
    TagResource { arn: String, tags: Tags },
    UntagResource { arn: String, keys: Vec<String> },
}

impl Call {
    /// Operation name used for failure injection, e.g. `"update_stack"`.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateAppBlock(_) => "create_app_block",
            Self::DescribeAppBlock { .. } => "describe_app_block",
            Self::DeleteAppBlock { .. } => "delete_app_block",
            Self::CreateApplication(_) => "create_application",
            Self::DescribeApplication { .. } => "describe_application",
            Self::UpdateApplication(_) => "update_application",
            Self::DeleteApplication { .. } => "delete_application",
            Self::CreateFleet(_) => "create_fleet",
            Self::DescribeFleet { .. } => "describe_fleet",
            Self::UpdateFleet(_) => "update_fleet",
            Self::DeleteFleet { .. } => "delete_fleet",
            Self::StartFleet { .. } => "start_fleet",
            Self::StopFleet { .. } => "stop_fleet",
            Self::CreateStack(_) => "create_stack",
            Self::DescribeStack { .. } => "describe_stack",
            Self::UpdateStack(_) => "update_stack",
            Self::DeleteStack { .. } => "delete_stack",
            Self::CreateDirectoryConfig(_) => "create_directory_config",
            Self::DescribeDirectoryConfig { .. } => "describe_directory_config",
            Self::UpdateDirectoryConfig(_) => "update_directory_config",
            Self::DeleteDirectoryConfig { .. } => "delete_directory_config",
            Self::AssociateFleet { .. } => "associate_fleet",
            Self::DisassociateFleet { .. } => "disassociate_fleet",
            Self::ListAssociatedStacks { .. } => "list_associated_stacks",
            Self::AssociateApplicationFleet { .. } => "associate_application_fleet",
            Self::DisassociateApplicationFleet { .. } => "disassociate_application_fleet",
            Self::DescribeApplicationFleetAssociations => "describe_application_fleet_associations",
            Self::BatchAssociateUserStack(_) => "batch_associate_user_stack",
            Self::BatchDisassociateUserStack(_) => "batch_disassociate_user_stack",
            Self::DescribeUserStackAssociations => "describe_user_stack_associations",
            Self::AssociateApplicationToEntitlement { .. } => "associate_application_to_entitlement",
            Self::DisassociateApplicationFromEntitlement { .. } => {
                "disassociate_application_from_entitlement"
            },
            Self::ListEntitledApplications { .. } => "list_entitled_applications",
            Self::ListTagsForResource { .. } => "list_tags_for_resource",
            Self::TagResource { .. } => "tag_resource",
            Self::UntagResource { .. } => "untag_resource",
        }
    }

    /// Whether the call only reads.
    pub fn is_read_only(&self) -> bool {
        let op = self.operation();
        op.starts_with("describe_") || op.starts_with("list_")
    }
}

/// Entities held by the fake.
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct FakeState {
    pub app_blocks: BTreeMap<String, AppBlock>,
    pub applications: BTreeMap<String, Application>,
    pub fleets: BTreeMap<String, Fleet>,
    pub stacks: BTreeMap<String, Stack>,
    pub directory_configs: BTreeMap<String, DirectoryConfig>,
    pub fleet_stacks: BTreeSet<(String, String)>,
    pub application_fleets: BTreeSet<(String, String)>,
    pub user_stacks: Vec<UserStackAssociation>,
    pub entitlements: BTreeSet<(String, String)>,
    pub entitled_applications: BTreeSet<(String, String, String)>,
    pub tags: BTreeMap<String, Tags>,
}

#[derive(Default)]
struct Inner {
    state: FakeState,
    calls: Vec<Call>,
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    user_stack_errors: VecDeque<String>,
    page_size: Option<usize>,
}

/// In-memory remote API for tests.
#[derive(Default)]
pub struct FakeAppStream {
    inner: Mutex<Inner>,
}

impl FakeAppStream {
    /// An empty fake.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, call: Call) -> Result<MutexGuard<'_, Inner>, ApiError> {
        let mut inner = self.lock();
        let op = call.operation();
        inner.calls.push(call);
        if let Some(err) = inner.failures.get_mut(op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        Ok(inner)
    }

    /// Fail the next call of `operation` with `err`. Queued failures are
    /// consumed in order.
    pub fn fail_next(&self, operation: &'static str, err: ApiError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(err);
    }

    /// Report `code` for every item of the next batch user-stack call.
    pub fn fail_next_user_stack_batch(&self, code: impl Into<String>) {
        self.lock().user_stack_errors.push_back(code.into());
    }

    /// Split listings into pages of `size` items.
    pub fn set_page_size(&self, size: usize) {
        self.lock().page_size = Some(size.max(1));
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls accepted by `filter`.
    pub fn calls_matching(&self, filter: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.lock().calls.iter().filter(|c| filter(c)).cloned().collect()
    }

    /// Calls that may have changed remote state.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls_matching(|c| !c.is_read_only())
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Inspect or modify the entities directly, e.g. to simulate drift.
    pub fn edit<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.lock().state)
    }

    /// Set the tags of `arn`.
    pub fn seed_tags(&self, arn: &str, tags: Tags) {
        self.edit(|s| s.tags.insert(arn.to_owned(), tags));
    }

    /// Tags currently on `arn`.
    pub fn tags_of(&self, arn: &str) -> Tags {
        self.edit(|s| s.tags.get(arn).cloned().unwrap_or_default())
    }

    /// Register an entitlement on a stack.
    pub fn seed_entitlement(&self, stack: &str, entitlement: &str) {
        self.edit(|s| s.entitlements.insert((stack.to_owned(), entitlement.to_owned())));
    }

    /// Current copy of a stack.
    pub fn stack(&self, name: &str) -> Option<Stack> {
        self.edit(|s| s.stacks.get(name).cloned())
    }

    /// Current copy of a fleet.
    pub fn fleet(&self, name: &str) -> Option<Fleet> {
        self.edit(|s| s.fleets.get(name).cloned())
    }
}

fn not_found(what: &str, name: &str) -> ApiError {
    ApiError::not_found(format!("{what} {name} not found"))
}

fn already_exists(what: &str, name: &str) -> ApiError {
    ApiError::new(codes::RESOURCE_ALREADY_EXISTS, format!("{what} {name} already exists"))
}

fn page<T: Clone>(items: Vec<T>, size: Option<usize>, token: Option<String>) -> Page<T> {
    let start = token.and_then(|t| t.parse::<usize>().ok()).unwrap_or(0);
    let Some(size) = size else {
        return Page::last(items.into_iter().skip(start).collect());
    };
    let end = (start + size).min(items.len());
    let next_token = (end < items.len()).then(|| end.to_string());
    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        next_token,
    }
}

fn remove_connector(stack: &mut Stack, connector_type: &str) {
    if let Some(connectors) = stack.storage_connectors.as_mut() {
        connectors.retain(|c| c.connector_type != connector_type);
    }
}

fn settings_response(settings: ApplicationSettings) -> ApplicationSettingsResponse {
    ApplicationSettingsResponse {
        enabled: Some(settings.enabled),
        s3_bucket_name: settings
            .enabled
            .then(|| "appstream-app-settings-us-east-1-123456789012".to_string()),
        settings_group: settings.settings_group,
    }
}

#[async_trait]
impl AppStreamApi for FakeAppStream {
    async fn create_app_block(&self, input: CreateAppBlockInput) -> ApiResult<AppBlock> {
        let mut inner = self.enter(Call::CreateAppBlock(input.clone()))?;
        let state = &mut inner.state;
        if state.app_blocks.contains_key(&input.name) {
            return Err(already_exists("app block", &input.name));
        }
        let block = AppBlock {
            arn: fake_arn("app-block", &input.name),
            name: input.name.clone(),
            display_name: input.display_name,
            description: input.description,
            source_s3_location: Some(input.source_s3_location),
            setup_script_details: input.setup_script_details,
            post_setup_script_details: input.post_setup_script_details,
            packaging_type: input.packaging_type.or_else(|| Some("CUSTOM".to_string())),
            state: Some("INACTIVE".to_string()),
            created_time: created_time(),
            app_block_errors: None,
        };
        state.tags.insert(block.arn.clone(), Tags::new());
        state.app_blocks.insert(input.name, block.clone());
        Ok(block)
    }

    async fn describe_app_block(&self, arn: &str) -> ApiResult<Option<AppBlock>> {
        let inner = self.enter(Call::DescribeAppBlock { arn: arn.to_owned() })?;
        inner
            .state
            .app_blocks
            .values()
            .find(|b| b.arn == arn)
            .cloned()
            .map(Some)
            .ok_or_else(|| not_found("app block", arn))
    }

    async fn delete_app_block(&self, name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::DeleteAppBlock { name: name.to_owned() })?;
        let block = inner
            .state
            .app_blocks
            .remove(name)
            .ok_or_else(|| not_found("app block", name))?;
        inner.state.tags.remove(&block.arn);
        Ok(())
    }

    async fn create_application(&self, input: CreateApplicationInput) -> ApiResult<Application> {
        let mut inner = self.enter(Call::CreateApplication(input.clone()))?;
        let state = &mut inner.state;
        if state.applications.contains_key(&input.name) {
            return Err(already_exists("application", &input.name));
        }
        let app = Application {
            arn: fake_arn("application", &input.name),
            name: input.name.clone(),
            display_name: input.display_name,
            description: input.description,
            icon_url: Some(format!("https://icons.example/{}", input.name)),
            icon_s3_location: Some(input.icon_s3_location),
            launch_path: Some(input.launch_path),
            working_directory: input.working_directory,
            launch_parameters: input.launch_parameters,
            platforms: Some(input.platforms),
            instance_families: Some(input.instance_families),
            app_block_arn: Some(input.app_block_arn),
            enabled: Some(true),
            created_time: created_time(),
        };
        state.tags.insert(app.arn.clone(), Tags::new());
        state.applications.insert(input.name, app.clone());
        Ok(app)
    }

    async fn describe_application(&self, arn: &str) -> ApiResult<Option<Application>> {
        let inner = self.enter(Call::DescribeApplication { arn: arn.to_owned() })?;
        Ok(inner.state.applications.values().find(|a| a.arn == arn).cloned())
    }

    async fn update_application(&self, input: UpdateApplicationInput) -> ApiResult<Application> {
        let mut inner = self.enter(Call::UpdateApplication(input.clone()))?;
        let app = inner
            .state
            .applications
            .get_mut(&input.name)
            .ok_or_else(|| not_found("application", &input.name))?;
        for attribute in &input.attributes_to_delete {
            match attribute {
                ApplicationAttribute::LaunchParameters => app.launch_parameters = None,
                ApplicationAttribute::WorkingDirectory => app.working_directory = None,
                ApplicationAttribute::Description => app.description = None,
                ApplicationAttribute::DisplayName => app.display_name = None,
            }
        }
        macro_rules! set {
            ($($field:ident),+) => {
                $(if let Some(v) = input.$field { app.$field = Some(v); })+
            };
        }
        set!(
            display_name,
            description,
            icon_s3_location,
            launch_path,
            working_directory,
            launch_parameters,
            app_block_arn
        );
        Ok(app.clone())
    }

    async fn delete_application(&self, name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::DeleteApplication { name: name.to_owned() })?;
        let app = inner
            .state
            .applications
            .remove(name)
            .ok_or_else(|| not_found("application", name))?;
        inner.state.tags.remove(&app.arn);
        Ok(())
    }

    async fn create_fleet(&self, input: CreateFleetInput) -> ApiResult<Fleet> {
        let mut inner = self.enter(Call::CreateFleet(input.clone()))?;
        let state = &mut inner.state;
        if state.fleets.contains_key(&input.name) {
            return Err(already_exists("fleet", &input.name));
        }
        let capacity = input.compute_capacity.unwrap_or_default();
        let fleet = Fleet {
            arn: fake_arn("fleet", &input.name),
            name: input.name.clone(),
            display_name: input.display_name,
            description: input.description,
            image_name: input.image_name,
            image_arn: input.image_arn,
            instance_type: input.instance_type,
            fleet_type: input.fleet_type.or_else(|| Some("ON_DEMAND".to_string())),
            compute_capacity_status: Some(ComputeCapacityStatus {
                desired: capacity.desired_instances.or(Some(0)),
                running: Some(0),
                in_use: Some(0),
                available: Some(0),
                desired_user_sessions: capacity.desired_sessions,
                ..Default::default()
            }),
            max_user_duration_in_seconds: input.max_user_duration_in_seconds.or(Some(57600)),
            disconnect_timeout_in_seconds: input.disconnect_timeout_in_seconds.or(Some(900)),
            idle_disconnect_timeout_in_seconds: input.idle_disconnect_timeout_in_seconds,
            state: FleetState::Stopped,
            vpc_config: input.vpc_config,
            created_time: created_time(),
            fleet_errors: None,
            enable_default_internet_access: input.enable_default_internet_access.or(Some(false)),
            domain_join_info: input.domain_join_info,
            iam_role_arn: input.iam_role_arn,
            stream_view: input.stream_view.or_else(|| Some("APP".to_string())),
            platform: input.platform.or_else(|| Some("WINDOWS_SERVER_2019".to_string())),
            max_concurrent_sessions: input.max_concurrent_sessions,
            usb_device_filter_strings: input.usb_device_filter_strings,
            session_script_s3_location: input.session_script_s3_location,
            max_sessions_per_instance: input.max_sessions_per_instance,
            root_volume_config: input.root_volume_config,
        };
        state.tags.insert(fleet.arn.clone(), Tags::new());
        state.fleets.insert(input.name, fleet.clone());
        Ok(fleet)
    }

    async fn describe_fleet(&self, name: &str) -> ApiResult<Option<Fleet>> {
        let mut inner = self.enter(Call::DescribeFleet { name: name.to_owned() })?;
        let fleet = inner
            .state
            .fleets
            .get_mut(name)
            .ok_or_else(|| not_found("fleet", name))?;
        let observed = fleet.clone();
        match fleet.state {
            FleetState::Starting => {
                fleet.state = FleetState::Running;
                if let Some(status) = fleet.compute_capacity_status.as_mut() {
                    status.running = status.desired;
                    status.available = status.desired;
                }
            },
            FleetState::Stopping => {
                fleet.state = FleetState::Stopped;
                if let Some(status) = fleet.compute_capacity_status.as_mut() {
                    status.running = Some(0);
                    status.available = Some(0);
                }
            },
            _ => {},
        }
        Ok(Some(observed))
    }

    async fn update_fleet(&self, input: UpdateFleetInput) -> ApiResult<Fleet> {
        let mut inner = self.enter(Call::UpdateFleet(input.clone()))?;
        let fleet = inner
            .state
            .fleets
            .get_mut(&input.name)
            .ok_or_else(|| not_found("fleet", &input.name))?;
        for attribute in &input.attributes_to_delete {
            match attribute {
                FleetAttribute::VpcConfiguration => fleet.vpc_config = None,
                FleetAttribute::VpcConfigurationSecurityGroupIds => {
                    if let Some(vpc) = fleet.vpc_config.as_mut() {
                        vpc.security_group_ids = None;
                    }
                },
                FleetAttribute::DomainJoinInfo => fleet.domain_join_info = None,
                FleetAttribute::IamRoleArn => fleet.iam_role_arn = None,
                FleetAttribute::UsbDeviceFilterStrings => fleet.usb_device_filter_strings = None,
                FleetAttribute::SessionScriptS3Location => fleet.session_script_s3_location = None,
                FleetAttribute::MaxSessionsPerInstance => fleet.max_sessions_per_instance = None,
                FleetAttribute::Description => fleet.description = None,
                FleetAttribute::DisplayName => fleet.display_name = None,
            }
        }
        macro_rules! set {
            ($($field:ident),+) => {
                $(if let Some(v) = input.$field { fleet.$field = Some(v); })+
            };
        }
        set!(
            display_name,
            description,
            image_name,
            image_arn,
            max_user_duration_in_seconds,
            disconnect_timeout_in_seconds,
            idle_disconnect_timeout_in_seconds,
            vpc_config,
            enable_default_internet_access,
            domain_join_info,
            iam_role_arn,
            stream_view,
            platform,
            max_concurrent_sessions,
            usb_device_filter_strings,
            session_script_s3_location,
            max_sessions_per_instance,
            root_volume_config
        );
        if let Some(instance_type) = input.instance_type {
            fleet.instance_type = instance_type;
        }
        if let Some(capacity) = input.compute_capacity {
            let status = fleet.compute_capacity_status.get_or_insert_with(Default::default);
            if capacity.desired_instances.is_some() {
                status.desired = capacity.desired_instances;
            }
            if capacity.desired_sessions.is_some() {
                status.desired_user_sessions = capacity.desired_sessions;
            }
        }
        Ok(fleet.clone())
    }

    async fn delete_fleet(&self, name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::DeleteFleet { name: name.to_owned() })?;
        let fleet = inner
            .state
            .fleets
            .get(name)
            .ok_or_else(|| not_found("fleet", name))?;
        if fleet.state != FleetState::Stopped {
            return Err(ApiError::new(
                codes::OPERATION_NOT_PERMITTED,
                format!("fleet {name} is {}", fleet.state),
            ));
        }
        let arn = fleet.arn.clone();
        inner.state.fleets.remove(name);
        inner.state.tags.remove(&arn);
        Ok(())
    }

    async fn start_fleet(&self, name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::StartFleet { name: name.to_owned() })?;
        let fleet = inner
            .state
            .fleets
            .get_mut(name)
            .ok_or_else(|| not_found("fleet", name))?;
        if fleet.state == FleetState::Stopped {
            fleet.state = FleetState::Starting;
        }
        Ok(())
    }

    async fn stop_fleet(&self, name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::StopFleet { name: name.to_owned() })?;
        let fleet = inner
            .state
            .fleets
            .get_mut(name)
            .ok_or_else(|| not_found("fleet", name))?;
        if matches!(fleet.state, FleetState::Running | FleetState::Starting) {
            fleet.state = FleetState::Stopping;
        }
        Ok(())
    }

    async fn create_stack(&self, input: CreateStackInput) -> ApiResult<Stack> {
        let mut inner = self.enter(Call::CreateStack(input.clone()))?;
        let state = &mut inner.state;
        if state.stacks.contains_key(&input.name) {
            return Err(already_exists("stack", &input.name));
        }
        let stack = Stack {
            arn: fake_arn("stack", &input.name),
            name: input.name.clone(),
            display_name: input.display_name,
            description: input.description,
            storage_connectors: input.storage_connectors,
            redirect_url: input.redirect_url,
            feedback_url: input.feedback_url,
            user_settings: input.user_settings,
            application_settings: input.application_settings.map(settings_response),
            access_endpoints: input.access_endpoints,
            embed_host_domains: input.embed_host_domains,
            streaming_experience_settings: input.streaming_experience_settings,
            stack_errors: None,
            created_time: created_time(),
        };
        state.tags.insert(stack.arn.clone(), Tags::new());
        state.stacks.insert(input.name, stack.clone());
        Ok(stack)
    }

    async fn describe_stack(&self, name: &str) -> ApiResult<Option<Stack>> {
        let inner = self.enter(Call::DescribeStack { name: name.to_owned() })?;
        inner
            .state
            .stacks
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| not_found("stack", name))
    }

    async fn update_stack(&self, input: UpdateStackInput) -> ApiResult<Stack> {
        let mut inner = self.enter(Call::UpdateStack(input.clone()))?;
        let stack = inner
            .state
            .stacks
            .get_mut(&input.name)
            .ok_or_else(|| not_found("stack", &input.name))?;
        for attribute in &input.attributes_to_delete {
            match attribute {
                StackAttribute::StorageConnectors => stack.storage_connectors = None,
                StackAttribute::StorageConnectorHomefolders => remove_connector(stack, "HOMEFOLDERS"),
                StackAttribute::StorageConnectorGoogleDrive => remove_connector(stack, "GOOGLE_DRIVE"),
                StackAttribute::StorageConnectorOneDrive => remove_connector(stack, "ONE_DRIVE"),
                StackAttribute::RedirectUrl => stack.redirect_url = None,
                StackAttribute::FeedbackUrl => stack.feedback_url = None,
                StackAttribute::UserSettings => stack.user_settings = None,
                StackAttribute::EmbedHostDomains => stack.embed_host_domains = None,
                StackAttribute::AccessEndpoints => stack.access_endpoints = None,
                StackAttribute::StreamingExperienceSettings => {
                    stack.streaming_experience_settings = None
                },
                StackAttribute::Description => stack.description = None,
                StackAttribute::DisplayName => stack.display_name = None,
            }
        }
        macro_rules! set {
            ($($field:ident),+) => {
                $(if let Some(v) = input.$field { stack.$field = Some(v); })+
            };
        }
        set!(
            display_name,
            description,
            storage_connectors,
            redirect_url,
            feedback_url,
            user_settings,
            access_endpoints,
            embed_host_domains,
            streaming_experience_settings
        );
        if let Some(settings) = input.application_settings {
            stack.application_settings = Some(settings_response(settings));
        }
        Ok(stack.clone())
    }

    async fn delete_stack(&self, name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::DeleteStack { name: name.to_owned() })?;
        let stack = inner
            .state
            .stacks
            .remove(name)
            .ok_or_else(|| not_found("stack", name))?;
        inner.state.tags.remove(&stack.arn);
        Ok(())
    }

    async fn create_directory_config(
        &self,
        input: DirectoryConfigInput,
    ) -> ApiResult<DirectoryConfig> {
        let mut inner = self.enter(Call::CreateDirectoryConfig(input.clone()))?;
        let state = &mut inner.state;
        if state.directory_configs.contains_key(&input.directory_name) {
            return Err(already_exists("directory config", &input.directory_name));
        }
        let config = DirectoryConfig {
            directory_name: input.directory_name.clone(),
            organizational_unit_distinguished_names: input.organizational_unit_distinguished_names,
            service_account_credentials: input.service_account_credentials.map(|c| {
                ServiceAccountCredentials {
                    account_name: c.account_name,
                    account_password: String::new(),
                }
            }),
            certificate_based_auth_properties: input.certificate_based_auth_properties,
            created_time: created_time(),
        };
        state.directory_configs.insert(input.directory_name, config.clone());
        Ok(config)
    }

    async fn describe_directory_config(&self, name: &str) -> ApiResult<Option<DirectoryConfig>> {
        let inner = self.enter(Call::DescribeDirectoryConfig { name: name.to_owned() })?;
        Ok(inner.state.directory_configs.get(name).cloned())
    }

    async fn update_directory_config(
        &self,
        input: DirectoryConfigInput,
    ) -> ApiResult<DirectoryConfig> {
        let mut inner = self.enter(Call::UpdateDirectoryConfig(input.clone()))?;
        let config = inner
            .state
            .directory_configs
            .get_mut(&input.directory_name)
            .ok_or_else(|| not_found("directory config", &input.directory_name))?;
        if let Some(ous) = input.organizational_unit_distinguished_names {
            config.organizational_unit_distinguished_names = Some(ous);
        }
        if let Some(creds) = input.service_account_credentials {
            config.service_account_credentials = Some(ServiceAccountCredentials {
                account_name: creds.account_name,
                account_password: String::new(),
            });
        }
        if let Some(props) = input.certificate_based_auth_properties {
            config.certificate_based_auth_properties = Some(props);
        }
        Ok(config.clone())
    }

    async fn delete_directory_config(&self, name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::DeleteDirectoryConfig { name: name.to_owned() })?;
        inner
            .state
            .directory_configs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("directory config", name))
    }

    async fn associate_fleet(&self, fleet_name: &str, stack_name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::AssociateFleet {
            fleet: fleet_name.to_owned(),
            stack: stack_name.to_owned(),
        })?;
        let state = &mut inner.state;
        if !state.fleets.contains_key(fleet_name) {
            return Err(not_found("fleet", fleet_name));
        }
        if !state.stacks.contains_key(stack_name) {
            return Err(not_found("stack", stack_name));
        }
        state
            .fleet_stacks
            .insert((fleet_name.to_owned(), stack_name.to_owned()));
        Ok(())
    }

    async fn disassociate_fleet(&self, fleet_name: &str, stack_name: &str) -> ApiResult<()> {
        let mut inner = self.enter(Call::DisassociateFleet {
            fleet: fleet_name.to_owned(),
            stack: stack_name.to_owned(),
        })?;
        let key = (fleet_name.to_owned(), stack_name.to_owned());
        if !inner.state.fleet_stacks.remove(&key) {
            return Err(not_found("association", &format!("{fleet_name}/{stack_name}")));
        }
        Ok(())
    }

    async fn list_associated_stacks(
        &self,
        fleet_name: &str,
        next_token: Option<String>,
    ) -> ApiResult<Page<String>> {
        let inner = self.enter(Call::ListAssociatedStacks {
            fleet: fleet_name.to_owned(),
        })?;
        if !inner.state.fleets.contains_key(fleet_name) {
            return Err(not_found("fleet", fleet_name));
        }
        let stacks = inner
            .state
            .fleet_stacks
            .iter()
            .filter(|(fleet, _)| fleet == fleet_name)
            .map(|(_, stack)| stack.clone())
            .collect();
        Ok(page(stacks, inner.page_size, next_token))
    }

    async fn associate_application_fleet(
        &self,
        fleet_name: &str,
        application_arn: &str,
    ) -> ApiResult<ApplicationFleetAssociation> {
        let mut inner = self.enter(Call::AssociateApplicationFleet {
            fleet: fleet_name.to_owned(),
            application_arn: application_arn.to_owned(),
        })?;
        let state = &mut inner.state;
        if !state.fleets.contains_key(fleet_name) {
            return Err(not_found("fleet", fleet_name));
        }
        if !state.applications.values().any(|a| a.arn == application_arn) {
            return Err(not_found("application", application_arn));
        }
        state
            .application_fleets
            .insert((fleet_name.to_owned(), application_arn.to_owned()));
        Ok(ApplicationFleetAssociation {
            fleet_name: fleet_name.to_owned(),
            application_arn: application_arn.to_owned(),
        })
    }

    async fn disassociate_application_fleet(
        &self,
        fleet_name: &str,
        application_arn: &str,
    ) -> ApiResult<()> {
        let mut inner = self.enter(Call::DisassociateApplicationFleet {
            fleet: fleet_name.to_owned(),
            application_arn: application_arn.to_owned(),
        })?;
        let key = (fleet_name.to_owned(), application_arn.to_owned());
        if !inner.state.application_fleets.remove(&key) {
            return Err(not_found("association", &format!("{fleet_name}/{application_arn}")));
        }
        Ok(())
    }

    async fn describe_application_fleet_associations(
        &self,
        fleet_name: Option<&str>,
        application_arn: Option<&str>,
        next_token: Option<String>,
    ) -> ApiResult<Page<ApplicationFleetAssociation>> {
        let inner = self.enter(Call::DescribeApplicationFleetAssociations)?;
        let items = inner
            .state
            .application_fleets
            .iter()
            .filter(|(fleet, app)| {
                fleet_name.map_or(true, |f| f == fleet) && application_arn.map_or(true, |a| a == app)
            })
            .map(|(fleet, app)| ApplicationFleetAssociation {
                fleet_name: fleet.clone(),
                application_arn: app.clone(),
            })
            .collect();
        Ok(page(items, inner.page_size, next_token))
    }

    async fn batch_associate_user_stack(
        &self,
        associations: Vec<UserStackAssociation>,
    ) -> ApiResult<Vec<UserStackAssociationError>> {
        let mut inner = self.enter(Call::BatchAssociateUserStack(associations.clone()))?;
        if let Some(code) = inner.user_stack_errors.pop_front() {
            return Ok(associations
                .into_iter()
                .map(|a| UserStackAssociationError {
                    user_stack_association: a,
                    error_message: Some(format!("{code} (injected)")),
                    error_code: code.clone(),
                })
                .collect());
        }
        let mut errors = Vec::new();
        for association in associations {
            if !inner.state.stacks.contains_key(&association.stack_name) {
                errors.push(UserStackAssociationError {
                    error_code: codes::STACK_NOT_FOUND.to_string(),
                    error_message: Some(format!("stack {} not found", association.stack_name)),
                    user_stack_association: association,
                });
                continue;
            }
            let exists = inner.state.user_stacks.iter().any(|u| {
                u.stack_name == association.stack_name
                    && u.user_name == association.user_name
                    && u.authentication_type == association.authentication_type
            });
            if !exists {
                inner.state.user_stacks.push(association);
            }
        }
        Ok(errors)
    }

    async fn batch_disassociate_user_stack(
        &self,
        associations: Vec<UserStackAssociation>,
    ) -> ApiResult<Vec<UserStackAssociationError>> {
        let mut inner = self.enter(Call::BatchDisassociateUserStack(associations.clone()))?;
        if let Some(code) = inner.user_stack_errors.pop_front() {
            return Ok(associations
                .into_iter()
                .map(|a| UserStackAssociationError {
                    user_stack_association: a,
                    error_message: None,
                    error_code: code.clone(),
                })
                .collect());
        }
        for association in associations {
            inner.state.user_stacks.retain(|u| {
                !(u.stack_name == association.stack_name
                    && u.user_name == association.user_name
                    && u.authentication_type == association.authentication_type)
            });
        }
        Ok(Vec::new())
    }

    async fn describe_user_stack_associations(
        &self,
        stack_name: Option<&str>,
        user_name: Option<&str>,
        authentication_type: Option<&str>,
        next_token: Option<String>,
    ) -> ApiResult<Page<UserStackAssociation>> {
        let inner = self.enter(Call::DescribeUserStackAssociations)?;
        let items = inner
            .state
            .user_stacks
            .iter()
            .filter(|u| {
                stack_name.map_or(true, |s| s == u.stack_name)
                    && user_name.map_or(true, |n| n == u.user_name)
                    && authentication_type.map_or(true, |t| t == u.authentication_type)
            })
            .cloned()
            .collect();
        Ok(page(items, inner.page_size, next_token))
    }

    async fn associate_application_to_entitlement(
        &self,
        stack_name: &str,
        entitlement_name: &str,
        application_identifier: &str,
    ) -> ApiResult<()> {
        let mut inner = self.enter(Call::AssociateApplicationToEntitlement {
            stack: stack_name.to_owned(),
            entitlement: entitlement_name.to_owned(),
            application: application_identifier.to_owned(),
        })?;
        let state = &mut inner.state;
        if !state
            .entitlements
            .contains(&(stack_name.to_owned(), entitlement_name.to_owned()))
        {
            return Err(ApiError::new(
                codes::ENTITLEMENT_NOT_FOUND,
                format!("entitlement {entitlement_name} not found"),
            ));
        }
        state.entitled_applications.insert((
            stack_name.to_owned(),
            entitlement_name.to_owned(),
            application_identifier.to_owned(),
        ));
        Ok(())
    }

    async fn disassociate_application_from_entitlement(
        &self,
        stack_name: &str,
        entitlement_name: &str,
        application_identifier: &str,
    ) -> ApiResult<()> {
        let mut inner = self.enter(Call::DisassociateApplicationFromEntitlement {
            stack: stack_name.to_owned(),
            entitlement: entitlement_name.to_owned(),
            application: application_identifier.to_owned(),
        })?;
        let key = (
            stack_name.to_owned(),
            entitlement_name.to_owned(),
            application_identifier.to_owned(),
        );
        if !inner.state.entitled_applications.remove(&key) {
            return Err(ApiError::new(
                codes::ENTITLEMENT_NOT_FOUND,
                format!("application {application_identifier} not entitled"),
            ));
        }
        Ok(())
    }

    async fn list_entitled_applications(
        &self,
        stack_name: &str,
        entitlement_name: &str,
        next_token: Option<String>,
    ) -> ApiResult<Page<EntitledApplication>> {
        let inner = self.enter(Call::ListEntitledApplications {
            stack: stack_name.to_owned(),
            entitlement: entitlement_name.to_owned(),
        })?;
        if !inner
            .state
            .entitlements
            .contains(&(stack_name.to_owned(), entitlement_name.to_owned()))
        {
            return Err(ApiError::new(
                codes::ENTITLEMENT_NOT_FOUND,
                format!("entitlement {entitlement_name} not found"),
            ));
        }
        let items = inner
            .state
            .entitled_applications
            .iter()
            .filter(|(s, e, _)| s == stack_name && e == entitlement_name)
            .map(|(_, _, app)| EntitledApplication {
                application_identifier: app.clone(),
            })
            .collect();
        Ok(page(items, inner.page_size, next_token))
    }

    async fn list_tags_for_resource(&self, arn: &str) -> ApiResult<Tags> {
        let inner = self.enter(Call::ListTagsForResource { arn: arn.to_owned() })?;
        inner
            .state
            .tags
            .get(arn)
            .cloned()
            .ok_or_else(|| not_found("resource", arn))
    }

    async fn tag_resource(&self, arn: &str, tags: Tags) -> ApiResult<()> {
        let mut inner = self.enter(Call::TagResource {
            arn: arn.to_owned(),
            tags: tags.clone(),
        })?;
        let current = inner
            .state
            .tags
            .get_mut(arn)
            .ok_or_else(|| not_found("resource", arn))?;
        current.extend(tags);
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: Vec<String>) -> ApiResult<()> {
        let mut inner = self.enter(Call::UntagResource {
            arn: arn.to_owned(),
            keys: keys.clone(),
        })?;
        let current = inner
            .state
            .tags
            .get_mut(arn)
            .ok_or_else(|| not_found("resource", arn))?;
        for key in keys {
            current.remove(&key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet_input(name: &str) -> CreateFleetInput {
        CreateFleetInput {
            name: name.to_string(),
            instance_type: "stream.standard.small".to_string(),
            image_name: Some("img".to_string()),
            compute_capacity: Some(ComputeCapacity {
                desired_instances: Some(2),
                desired_sessions: None,
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fleet_settles_one_describe_after_start() {
        let fake = FakeAppStream::new();
        fake.create_fleet(fleet_input("f1")).await.unwrap();
        fake.start_fleet("f1").await.unwrap();

        let first = fake.describe_fleet("f1").await.unwrap().unwrap();
        assert_eq!(first.state, FleetState::Starting);
        let second = fake.describe_fleet("f1").await.unwrap().unwrap();
        assert_eq!(second.state, FleetState::Running);
        assert_eq!(second.compute_capacity_status.unwrap().running, Some(2));
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed_in_order() {
        let fake = FakeAppStream::new();
        fake.fail_next("describe_stack", ApiError::new(codes::CONCURRENT_MODIFICATION, "busy"));

        let err = fake.describe_stack("s1").await.unwrap_err();
        assert_eq!(err.code, codes::CONCURRENT_MODIFICATION);
        let err = fake.describe_stack("s1").await.unwrap_err();
        assert_eq!(err.code, codes::RESOURCE_NOT_FOUND);
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_user_stack_reports_missing_stack() {
        let fake = FakeAppStream::new();
        let association = UserStackAssociation {
            stack_name: "S".to_string(),
            user_name: "u@x".to_string(),
            authentication_type: "USERPOOL".to_string(),
            send_email_notification: None,
        };
        let errors = fake
            .batch_associate_user_stack(vec![association])
            .await
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code, codes::STACK_NOT_FOUND);
    }

    #[test]
    fn test_paging() {
        let items: Vec<u32> = (0..5).collect();
        let first = page(items.clone(), Some(2), None);
        assert_eq!(first.items, vec![0, 1]);
        let second = page(items.clone(), Some(2), first.next_token);
        assert_eq!(second.items, vec![2, 3]);
        let third = page(items, Some(2), second.next_token);
        assert_eq!(third.items, vec![4]);
        assert_eq!(third.next_token, None);
    }
}
