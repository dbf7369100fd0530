use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Storage key of the session token. Credential: never exported, never imported.
pub const AUTH_TOKEN_KEY: &str = "rabbit_farm_auth_token";
/// Storage key of the logged-in user. Credential: never exported, never imported.
pub const SESSION_USER_KEY: &str = "rabbit_farm_user";
/// Storage key of the free-form settings object.
pub const SETTINGS_KEY: &str = "rabbit_farm_settings";

/// Default prefix for exported data files: `<prefix>_<YYYY-MM-DD>.json`
pub const DEFAULT_EXPORT_PREFIX: &str = "rabbit_farm_data";

/// Returns true for keys that hold credentials or session state
pub fn is_credential_key(key: &str) -> bool {
    key == AUTH_TOKEN_KEY || key == SESSION_USER_KEY
}

/// One named set of same-typed farm records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Rabbits,
    BreedingRecords,
    HealthRecords,
    FeedInventory,
    FeedConsumption,
    Tasks,
    Activities,
}

impl Collection {
    /// Every collection, in export order
    pub const ALL: [Collection; 8] = [
        Collection::Users,
        Collection::Rabbits,
        Collection::BreedingRecords,
        Collection::HealthRecords,
        Collection::FeedInventory,
        Collection::FeedConsumption,
        Collection::Tasks,
        Collection::Activities,
    ];

    /// Key under which the collection is persisted and exported
    pub fn storage_key(self) -> &'static str {
        match self {
            Collection::Users => "rabbit_farm_users",
            Collection::Rabbits => "rabbit_farm_rabbits",
            Collection::BreedingRecords => "rabbit_farm_breeding_records",
            Collection::HealthRecords => "rabbit_farm_health_records",
            Collection::FeedInventory => "rabbit_farm_feed_inventory",
            Collection::FeedConsumption => "rabbit_farm_feed_consumption",
            Collection::Tasks => "rabbit_farm_tasks",
            Collection::Activities => "rabbit_farm_activities",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.storage_key() == key)
    }

    /// Short name used in URLs and CSV file names
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Rabbits => "rabbits",
            Collection::BreedingRecords => "breeding_records",
            Collection::HealthRecords => "health_records",
            Collection::FeedInventory => "feed_inventory",
            Collection::FeedConsumption => "feed_consumption",
            Collection::Tasks => "tasks",
            Collection::Activities => "activities",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record stored in one of the farm collections
pub trait FarmRecord: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> i64;

    /// Field-level checks beyond what deserialization already enforces
    fn validate(&self) -> Result<(), RecordValidationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    InvalidId(i64),
    EmptyField(&'static str),
    LitterAliveExceedsSize { alive: u32, size: u32 },
}

impl fmt::Display for RecordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValidationError::InvalidId(id) => write!(f, "id must be a positive integer, got {}", id),
            RecordValidationError::EmptyField(field) => write!(f, "{} cannot be empty", field),
            RecordValidationError::LitterAliveExceedsSize { alive, size } => write!(
                f,
                "litter alive ({}) cannot exceed litter size ({})",
                alive, size
            ),
        }
    }
}

impl std::error::Error for RecordValidationError {}

fn require_id(id: i64) -> Result<(), RecordValidationError> {
    if id <= 0 {
        return Err(RecordValidationError::InvalidId(id));
    }
    Ok(())
}

fn require_text(field: &'static str, value: &str) -> Result<(), RecordValidationError> {
    if value.trim().is_empty() {
        return Err(RecordValidationError::EmptyField(field));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Worker,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Manager => write!(f, "manager"),
            UserRole::Worker => write!(f, "worker"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Plaintext password; stripped from exports and API responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// Tag ids of the rabbits a worker is responsible for
    #[serde(default)]
    pub assigned_rabbits: Vec<String>,
}

impl User {
    pub fn without_credentials(mut self) -> Self {
        self.password = None;
        self
    }

    pub fn is_assigned(&self, tag_id: &str) -> bool {
        self.assigned_rabbits.iter().any(|t| t == tag_id)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            assigned_rabbits: self.assigned_rabbits.clone(),
        }
    }
}

impl FarmRecord for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)?;
        require_text("username", &self.username)?;
        require_text("fullName", &self.full_name)
    }
}

/// Public view of a user, as returned on login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub assigned_rabbits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub assigned_rabbits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub assigned_rabbits: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

// ---------------------------------------------------------------------------
// Rabbits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RabbitStatus {
    #[default]
    Active,
    Pregnant,
    Sick,
    ForSale,
    Inactive,
    /// Substitutes for deletion; records are never removed
    Deceased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Sick,
    UnderTreatment,
    Recovering,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rabbit {
    pub id: i64,
    /// Human-assigned identifier, used by other records as a loose foreign key
    pub tag_id: String,
    pub breed: String,
    pub gender: Gender,
    pub birth_date: Option<DateTime<Utc>>,
    pub acquired_date: DateTime<Utc>,
    #[serde(default)]
    pub status: RabbitStatus,
    /// Weight in grams
    pub weight: Option<u32>,
    pub cage_number: Option<String>,
    pub parent_male_id: Option<String>,
    pub parent_female_id: Option<String>,
    pub notes: Option<String>,
    pub created_by: i64,
    #[serde(default)]
    pub health_status: HealthStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FarmRecord for Rabbit {
    const COLLECTION: Collection = Collection::Rabbits;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)?;
        require_text("tagId", &self.tag_id)?;
        require_text("breed", &self.breed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRabbitRequest {
    pub tag_id: String,
    pub breed: String,
    pub gender: Gender,
    pub birth_date: Option<DateTime<Utc>>,
    pub acquired_date: DateTime<Utc>,
    #[serde(default)]
    pub status: RabbitStatus,
    pub weight: Option<u32>,
    pub cage_number: Option<String>,
    pub parent_male_id: Option<String>,
    pub parent_female_id: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub health_status: HealthStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRabbitRequest {
    pub tag_id: Option<String>,
    pub breed: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<DateTime<Utc>>,
    pub acquired_date: Option<DateTime<Utc>>,
    pub status: Option<RabbitStatus>,
    pub weight: Option<u32>,
    pub cage_number: Option<String>,
    pub parent_male_id: Option<String>,
    pub parent_female_id: Option<String>,
    pub notes: Option<String>,
    pub health_status: Option<HealthStatus>,
}

// ---------------------------------------------------------------------------
// Breeding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreedingStatus {
    /// Awaiting birth
    #[default]
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreedingRecord {
    pub id: i64,
    /// Tag id of the buck
    pub male_id: String,
    /// Tag id of the doe
    pub female_id: String,
    pub mating_date: DateTime<Utc>,
    pub expected_birth_date: Option<DateTime<Utc>>,
    pub actual_birth_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: BreedingStatus,
    pub litter_size: Option<u32>,
    pub litter_alive: Option<u32>,
    pub notes: Option<String>,
    pub created_by: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FarmRecord for BreedingRecord {
    const COLLECTION: Collection = Collection::BreedingRecords;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)?;
        require_text("maleId", &self.male_id)?;
        require_text("femaleId", &self.female_id)?;
        if let (Some(size), Some(alive)) = (self.litter_size, self.litter_alive) {
            if alive > size {
                return Err(RecordValidationError::LitterAliveExceedsSize { alive, size });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBreedingRecordRequest {
    pub male_id: String,
    pub female_id: String,
    pub mating_date: DateTime<Utc>,
    pub expected_birth_date: Option<DateTime<Utc>>,
    pub actual_birth_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: BreedingStatus,
    pub litter_size: Option<u32>,
    pub litter_alive: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBreedingRecordRequest {
    pub male_id: Option<String>,
    pub female_id: Option<String>,
    pub mating_date: Option<DateTime<Utc>>,
    pub expected_birth_date: Option<DateTime<Utc>>,
    pub actual_birth_date: Option<DateTime<Utc>>,
    pub status: Option<BreedingStatus>,
    pub litter_size: Option<u32>,
    pub litter_alive: Option<u32>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthRecordType {
    Vaccination,
    Medication,
    Checkup,
    Illness,
    Injury,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: i64,
    /// Tag id of the rabbit; not checked against the rabbits collection
    pub rabbit_id: String,
    pub record_date: DateTime<Utc>,
    pub record_type: HealthRecordType,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub created_by: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FarmRecord for HealthRecord {
    const COLLECTION: Collection = Collection::HealthRecords;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)?;
        require_text("rabbitId", &self.rabbit_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHealthRecordRequest {
    pub rabbit_id: String,
    pub record_date: DateTime<Utc>,
    pub record_type: HealthRecordType,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHealthRecordRequest {
    pub record_date: Option<DateTime<Utc>>,
    pub record_type: Option<HealthRecordType>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedInventory {
    pub id: i64,
    pub feed_type: String,
    /// Grams or units on hand
    pub quantity: u32,
    pub acquired: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub supplier_info: Option<String>,
    /// Cost in cents
    pub cost: Option<u32>,
    pub created_by: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FarmRecord for FeedInventory {
    const COLLECTION: Collection = Collection::FeedInventory;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)?;
        require_text("feedType", &self.feed_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedInventoryRequest {
    pub feed_type: String,
    pub quantity: u32,
    pub acquired: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub supplier_info: Option<String>,
    pub cost: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedInventoryRequest {
    pub feed_type: Option<String>,
    pub quantity: Option<u32>,
    pub acquired: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub supplier_info: Option<String>,
    pub cost: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConsumption {
    pub id: i64,
    /// Numeric id of the feed inventory item drawn from
    pub feed_id: i64,
    pub quantity: u32,
    pub consumption_date: DateTime<Utc>,
    /// Cage or group identifier
    pub group_id: Option<String>,
    pub notes: Option<String>,
    pub created_by: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FarmRecord for FeedConsumption {
    const COLLECTION: Collection = Collection::FeedConsumption;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedConsumptionRequest {
    pub feed_id: i64,
    pub quantity: u32,
    pub consumption_date: DateTime<Utc>,
    pub group_id: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Canceled => write!(f, "canceled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TaskStatus,
    /// User id of the assignee
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl FarmRecord for Task {
    const COLLECTION: Collection = Collection::Tasks;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)?;
        require_text("title", &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TaskStatus,
    pub assigned_to: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<i64>,
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Login,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Rabbit,
    Breeding,
    Health,
    Feed,
    Task,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub activity_type: ActivityType,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub related_entity_type: Option<EntityType>,
    pub related_entity_id: Option<String>,
}

impl FarmRecord for Activity {
    const COLLECTION: Collection = Collection::Activities;

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<(), RecordValidationError> {
        require_id(self.id)?;
        require_text("description", &self.description)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeDistribution {
    /// Up to 3 months old
    pub young: u32,
    /// Older than 3 and up to 12 months
    pub adult: u32,
    /// Older than 12 months
    pub senior: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub birth_rate: u32,
    pub average_litter_size: f64,
    /// Percentage of kits born in successful litters that did not survive
    pub mortality_rate: f64,
    pub rabbits_for_sale: u32,
    pub available_cages: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_rabbits: u32,
    pub active_breeding: u32,
    pub active_medical: u32,
    /// Feed on hand in kilograms
    pub feed_stock: f64,
    pub age_distribution: AgeDistribution,
    pub breed_distribution: BTreeMap<String, u32>,
    pub quick_stats: QuickStats,
}

// ---------------------------------------------------------------------------
// Data exchange
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Overwrite each present collection wholesale; incoming wins
    #[default]
    Replace,
    /// Union by id; existing records win on collision
    Merge,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Replace => write!(f, "replace"),
            ImportMode::Merge => write!(f, "merge"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDataResponse {
    /// Pretty-printed JSON document keyed by storage key
    pub content: String,
    pub filename: String,
    /// Number of records exported per collection
    pub record_counts: BTreeMap<Collection, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportToPathRequest {
    /// Target directory; the user's Documents directory when absent
    pub custom_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportToPathResponse {
    pub success: bool,
    pub message: String,
    pub file_path: String,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCsvResponse {
    pub csv_content: String,
    pub filename: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDataRequest {
    /// Raw JSON document text
    pub content: String,
    #[serde(default)]
    pub mode: ImportMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFromPathRequest {
    pub file_path: String,
    #[serde(default)]
    pub mode: ImportMode,
}

/// What an import did to one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionImportSummary {
    pub collection: Collection,
    /// Records present in the document
    pub incoming: usize,
    /// Records written from the document
    pub added: usize,
    /// Incoming records dropped because the id already existed (merge only)
    pub skipped: usize,
    /// Size of the collection after the import
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDataResponse {
    pub mode: ImportMode,
    pub collections: Vec<CollectionImportSummary>,
    pub success_message: String,
}

/// Error body returned by the REST layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_storage_keys_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_storage_key(collection.storage_key()), Some(collection));
            assert_eq!(Collection::from_name(collection.name()), Some(collection));
        }
        assert_eq!(Collection::from_storage_key(AUTH_TOKEN_KEY), None);
        assert_eq!(Collection::from_storage_key(SESSION_USER_KEY), None);
        assert_eq!(Collection::from_storage_key(SETTINGS_KEY), None);
    }

    #[test]
    fn test_credential_keys() {
        assert!(is_credential_key("rabbit_farm_auth_token"));
        assert!(is_credential_key("rabbit_farm_user"));
        assert!(!is_credential_key("rabbit_farm_users"));
        assert!(!is_credential_key("rabbit_farm_rabbits"));
    }

    #[test]
    fn test_rabbit_deserializes_with_defaults() {
        let rabbit: Rabbit = serde_json::from_value(json!({
            "id": 1,
            "tagId": "R-1",
            "breed": "New Zealand White",
            "gender": "female",
            "acquiredDate": "2024-03-01T00:00:00Z",
            "createdBy": 1
        }))
        .unwrap();

        assert_eq!(rabbit.tag_id, "R-1");
        assert_eq!(rabbit.status, RabbitStatus::Active);
        assert_eq!(rabbit.health_status, HealthStatus::Healthy);
        assert!(rabbit.birth_date.is_none());
        assert!(rabbit.validate().is_ok());
    }

    #[test]
    fn test_rabbit_missing_required_field_is_rejected() {
        let result = serde_json::from_value::<Rabbit>(json!({
            "id": 1,
            "tagId": "R-1",
            "gender": "male",
            "acquiredDate": "2024-03-01T00:00:00Z",
            "createdBy": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_password_not_serialized_when_stripped() {
        let user = User {
            id: 1,
            username: "admin".to_string(),
            password: Some("admin123".to_string()),
            full_name: "Farm Administrator".to_string(),
            role: UserRole::Admin,
            is_active: true,
            created_at: None,
            last_login: None,
            assigned_rabbits: vec![],
        };

        let value = serde_json::to_value(user.clone()).unwrap();
        assert_eq!(value["password"], "admin123");

        let value = serde_json::to_value(user.without_credentials()).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["fullName"], "Farm Administrator");
    }

    #[test]
    fn test_breeding_record_validation() {
        let mut record: BreedingRecord = serde_json::from_value(json!({
            "id": 3,
            "maleId": "R-1",
            "femaleId": "R-2",
            "matingDate": "2024-05-01T00:00:00Z",
            "status": "success",
            "litterSize": 6,
            "litterAlive": 5,
            "createdBy": 1
        }))
        .unwrap();
        assert!(record.validate().is_ok());

        record.litter_alive = Some(7);
        assert_eq!(
            record.validate(),
            Err(RecordValidationError::LitterAliveExceedsSize { alive: 7, size: 6 })
        );

        record.litter_alive = Some(5);
        record.male_id = "  ".to_string();
        assert_eq!(record.validate(), Err(RecordValidationError::EmptyField("maleId")));
    }

    #[test]
    fn test_non_positive_id_is_invalid() {
        let task = Task {
            id: 0,
            title: "Clean cages".to_string(),
            description: None,
            due_date: None,
            status: TaskStatus::Pending,
            assigned_to: None,
            created_by: 1,
            created_at: None,
            completed_at: None,
        };
        assert_eq!(task.validate(), Err(RecordValidationError::InvalidId(0)));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(RabbitStatus::ForSale).unwrap(), "for_sale");
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in_progress");
        assert_eq!(serde_json::to_value(HealthStatus::UnderTreatment).unwrap(), "under_treatment");
        assert_eq!(serde_json::to_value(ImportMode::Merge).unwrap(), "merge");
        assert_eq!(serde_json::to_value(Collection::FeedInventory).unwrap(), "feed_inventory");
    }

    #[test]
    fn test_import_request_defaults_to_replace() {
        let request: ImportDataRequest = serde_json::from_value(json!({ "content": "{}" })).unwrap();
        assert_eq!(request.mode, ImportMode::Replace);
    }
}
