// Data models for the task, note, finance and preference stores

use crate::record::Record;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed string enumeration: one source of truth for the wire text, `Display`,
/// `FromStr` and serde. Unknown values are rejected on parse.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every member, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = eyre::Report;

            fn from_str(s: &str) -> eyre::Result<Self> {
                match s.trim().to_lowercase().as_str() {
                    $($text $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(eyre::eyre!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as Deserialize>::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

// ============================================================================
// Tasks
// ============================================================================

string_enum! {
    TaskPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

impl TaskPriority {
    /// Sort weight, higher is more pressing
    pub fn weight(&self) -> u8 {
        match self {
            TaskPriority::Urgent => 4,
            TaskPriority::High => 3,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 1,
        }
    }
}

string_enum! {
    TaskCategory {
        Work => "work",
        Personal => "personal",
        Health => "health",
        Learning => "learning",
        Finance => "finance",
        Other => "other",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: TaskPriority,
    pub category: TaskCategory,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl TaskDraft {
    /// Open task with medium priority in the `other` category
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            completed: false,
            priority: TaskPriority::Medium,
            category: TaskCategory::Other,
            due_date: None,
            tags: None,
        }
    }
}

/// Partial task update. Doubly-optional fields can be cleared with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub tags: Option<Option<Vec<String>>>,
}

impl Record for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    fn collection_name() -> &'static str {
        "tasks"
    }

    fn from_draft(id: String, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            completed: draft.completed,
            priority: draft.priority,
            category: draft.category,
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
            tags: draft.tags,
        }
    }

    fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

// ============================================================================
// Notes
// ============================================================================

string_enum! {
    NoteCategory {
        Ideas => "ideas",
        Meetings => "meetings",
        Journal => "journal",
        Reference => "reference",
        Todo => "todo",
        Other => "other",
    }
}

string_enum! {
    /// Fixed note palette, stored as hex colors
    NoteColor {
        White => "#ffffff" | "white",
        Yellow => "#fef3c7" | "yellow",
        Green => "#d1fae5" | "green",
        Blue => "#dbeafe" | "blue",
        Purple => "#e9d5ff" | "purple",
        Pink => "#fce7f3" | "pink",
        Red => "#fee2e2" | "red",
        Gray => "#f3f4f6" | "gray" | "grey",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category: NoteCategory,
    pub color: NoteColor,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub color: NoteColor,
    pub tags: Vec<String>,
    pub is_pinned: bool,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: NoteCategory::Other,
            color: NoteColor::White,
            tags: Vec::new(),
            is_pinned: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<NoteCategory>,
    pub color: Option<NoteColor>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

impl Record for Note {
    type Draft = NoteDraft;
    type Patch = NotePatch;

    fn collection_name() -> &'static str {
        "notes"
    }

    fn from_draft(id: String, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            category: draft.category,
            color: draft.color,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
            is_pinned: draft.is_pinned,
        }
    }

    fn apply(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(is_pinned) = patch.is_pinned {
            self.is_pinned = is_pinned;
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

// ============================================================================
// Transactions
// ============================================================================

string_enum! {
    TransactionType {
        Income => "income",
        Expense => "expense",
    }
}

string_enum! {
    TransactionCategory {
        Salary => "salary",
        Freelance => "freelance",
        Investment => "investment",
        Business => "business",
        OtherIncome => "other_income",
        Food => "food",
        Transportation => "transportation",
        Housing => "housing",
        Utilities => "utilities",
        Healthcare => "healthcare",
        Entertainment => "entertainment",
        Shopping => "shopping",
        Education => "education",
        Subscriptions => "subscriptions",
        OtherExpense => "other_expense",
    }
}

impl TransactionCategory {
    /// The direction this category belongs to
    pub fn kind(&self) -> TransactionType {
        match self {
            TransactionCategory::Salary
            | TransactionCategory::Freelance
            | TransactionCategory::Investment
            | TransactionCategory::Business
            | TransactionCategory::OtherIncome => TransactionType::Income,
            _ => TransactionType::Expense,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.kind() == TransactionType::Expense
    }

    /// Expense categories in declaration order
    pub fn expense_categories() -> impl Iterator<Item = TransactionCategory> {
        Self::ALL.iter().copied().filter(|c| c.is_expense())
    }

    /// Human label, e.g. `other expense`
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

string_enum! {
    RecurringFrequency {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    pub frequency: RecurringFrequency,
    /// Every `interval` days/weeks/months/years
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Always positive; direction comes from `kind`
    pub amount: Decimal,
    pub description: String,
    pub category: TransactionCategory,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_pattern: Option<RecurringPattern>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Transaction {
    /// Amount with the sign implied by the direction
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub category: TransactionCategory,
    pub date: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<RecurringPattern>,
    pub tags: Option<Vec<String>>,
}

impl TransactionDraft {
    /// One-off transaction; the direction follows the category
    pub fn new(
        amount: Decimal,
        description: impl Into<String>,
        category: TransactionCategory,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: category.kind(),
            amount,
            description: description.into(),
            category,
            date,
            is_recurring: false,
            recurring_pattern: None,
            tags: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub kind: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<TransactionCategory>,
    pub date: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
    pub recurring_pattern: Option<Option<RecurringPattern>>,
    pub tags: Option<Option<Vec<String>>>,
}

impl Record for Transaction {
    type Draft = TransactionDraft;
    type Patch = TransactionPatch;

    fn collection_name() -> &'static str {
        "transactions"
    }

    fn from_draft(id: String, draft: TransactionDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: draft.kind,
            amount: draft.amount,
            description: draft.description,
            category: draft.category,
            date: draft.date,
            is_recurring: draft.is_recurring,
            recurring_pattern: draft.recurring_pattern,
            created_at: now,
            updated_at: now,
            tags: draft.tags,
        }
    }

    fn apply(&mut self, patch: TransactionPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(is_recurring) = patch.is_recurring {
            self.is_recurring = is_recurring;
        }
        if let Some(pattern) = patch.recurring_pattern {
            self.recurring_pattern = pattern;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

// ============================================================================
// User and preferences
// ============================================================================

string_enum! {
    Theme {
        Light => "light",
        Dark => "dark",
        System => "system",
    }
}

string_enum! {
    TimeFormat {
        TwelveHour => "12h",
        TwentyFourHour => "24h",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub task_reminders: bool,
    pub due_date_alerts: bool,
    pub recurring_transaction_alerts: bool,
    pub push_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            task_reminders: true,
            due_date_alerts: true,
            recurring_transaction_alerts: true,
            push_notifications: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub theme: Theme,
    pub currency: String,
    pub date_format: String,
    pub time_format: TimeFormat,
    pub notifications: NotificationSettings,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            currency: "USD".to_string(),
            date_format: "MM/DD/YYYY".to_string(),
            time_format: TimeFormat::TwelveHour,
            notifications: NotificationSettings::default(),
        }
    }
}

/// Shallow preference update; `notifications` replaces the whole block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub theme: Option<Theme>,
    pub currency: Option<String>,
    pub date_format: Option<String>,
    pub time_format: Option<TimeFormat>,
    pub notifications: Option<NotificationSettings>,
}

impl UserPreferences {
    pub fn apply(&mut self, patch: PreferencesPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(date_format) = patch.date_format {
            self.date_format = date_format;
        }
        if let Some(time_format) = patch.time_format {
            self.time_format = time_format;
        }
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
