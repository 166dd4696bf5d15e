//! User profile types and completion scoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User ID - primary identifier for user profiles
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("user:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Age-verification state recorded on the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeVerificationStatus {
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl AgeVerificationStatus {
    /// A terminal determination exists for this profile. Pending marks an
    /// attempt in flight, not a determination.
    pub fn is_determined(&self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl Default for AgeVerificationStatus {
    fn default() -> Self {
        Self::Unverified
    }
}

impl std::fmt::Display for AgeVerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Provisional account created before onboarding finishes
    Anonymous,
    Individual,
    /// Full parent account
    Family,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Individual => "individual",
            Self::Family => "family",
        }
    }
}

impl Default for AccountType {
    fn default() -> Self {
        Self::Anonymous
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of profile fields tracked by the completion score: username,
/// email, display name, avatar, bio, date of birth, and a determined
/// age-verification status.
pub const TRACKED_PROFILE_FIELDS: usize = 7;

/// A user profile record
///
/// The verification pipeline only mutates the verification fields,
/// completion/onboarding fields, `account_type` and `device_token`; the
/// free-text fields are owned by the wider user-management flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    pub age_verification_status: AgeVerificationStatus,
    pub age_verification_date: Option<DateTime<Utc>>,
    /// Provider label of the deciding verification, e.g. "ondato"
    pub verification_method: Option<String>,
    /// Integer percentage in [0, 100]
    pub profile_completion: u8,
    pub onboarding_complete: bool,
    pub account_type: AccountType,
    /// Push token for the user's current device
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create an empty provisional profile.
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username: None,
            email: None,
            display_name: None,
            avatar: None,
            bio: None,
            date_of_birth: None,
            age_verification_status: AgeVerificationStatus::default(),
            age_verification_date: None,
            verification_method: None,
            profile_completion: 0,
            onboarding_complete: false,
            account_type: AccountType::default(),
            device_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn filled_tracked_fields(&self) -> usize {
        let text_fields = [
            &self.username,
            &self.email,
            &self.display_name,
            &self.avatar,
            &self.bio,
            &self.date_of_birth,
        ];
        let filled = text_fields
            .iter()
            .filter(|field| matches!(field.as_deref(), Some(value) if !value.is_empty()))
            .count();

        filled + usize::from(self.age_verification_status.is_determined())
    }

    /// Completion percentage over the fixed tracked-field set:
    /// `round(100 * filled / total)`.
    pub fn completion_score(&self) -> u8 {
        let filled = self.filled_tracked_fields();
        ((filled as f64 * 100.0) / TRACKED_PROFILE_FIELDS as f64).round() as u8
    }

    /// Recompute `profile_completion` and `onboarding_complete` in place.
    pub fn refresh_completion(&mut self) {
        self.profile_completion = self.completion_score();
        self.onboarding_complete = self.profile_completion >= 100;
    }

    pub fn is_complete(&self) -> bool {
        self.profile_completion >= 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_profile() -> UserProfile {
        let mut profile = UserProfile::new(UserId::generate(), Utc::now());
        profile.username = Some("skyrunner".to_string());
        profile.email = Some("sky@example.com".to_string());
        profile.display_name = Some("Sky Runner".to_string());
        profile.avatar = Some("https://cdn.example.com/a.png".to_string());
        profile.bio = Some("Coach and parent".to_string());
        profile.date_of_birth = Some("1984-09-17".to_string());
        profile.age_verification_status = AgeVerificationStatus::Verified;
        profile
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let profile = UserProfile::new(UserId::generate(), Utc::now());
        assert_eq!(profile.completion_score(), 0);
    }

    #[test]
    fn test_full_profile_scores_exactly_one_hundred() {
        assert_eq!(full_profile().completion_score(), 100);
    }

    #[test]
    fn test_score_is_monotone_in_filled_fields() {
        let mut profile = UserProfile::new(UserId::generate(), Utc::now());
        let mut last = profile.completion_score();

        profile.username = Some("a".to_string());
        assert!(profile.completion_score() > last);
        last = profile.completion_score();

        profile.email = Some("a@b.c".to_string());
        assert!(profile.completion_score() > last);
    }

    #[test]
    fn test_empty_string_does_not_count() {
        let mut profile = UserProfile::new(UserId::generate(), Utc::now());
        profile.username = Some(String::new());
        assert_eq!(profile.completion_score(), 0);
    }

    #[test]
    fn test_rejected_status_counts_as_determined() {
        let mut profile = full_profile();
        profile.age_verification_status = AgeVerificationStatus::Rejected;
        assert_eq!(profile.completion_score(), 100);

        profile.age_verification_status = AgeVerificationStatus::Pending;
        assert!(profile.completion_score() < 100);
    }

    #[test]
    fn test_refresh_completion_sets_onboarding_flag() {
        let mut profile = full_profile();
        profile.refresh_completion();

        assert_eq!(profile.profile_completion, 100);
        assert!(profile.onboarding_complete);
        assert!(profile.is_complete());
    }

    #[test]
    fn test_score_stays_in_range() {
        let mut profile = UserProfile::new(UserId::generate(), Utc::now());
        for filled in 0..=6 {
            profile.refresh_completion();
            assert!(profile.profile_completion <= 100);
            let fields = [
                "username",
                "email",
                "display_name",
                "avatar",
                "bio",
                "date_of_birth",
            ];
            if filled < fields.len() {
                match fields[filled] {
                    "username" => profile.username = Some("x".to_string()),
                    "email" => profile.email = Some("x".to_string()),
                    "display_name" => profile.display_name = Some("x".to_string()),
                    "avatar" => profile.avatar = Some("x".to_string()),
                    "bio" => profile.bio = Some("x".to_string()),
                    _ => profile.date_of_birth = Some("x".to_string()),
                }
            }
        }
        profile.refresh_completion();
        assert_eq!(profile.profile_completion, 86);
    }
}
