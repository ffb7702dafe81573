//! Staff access gating.
//!
//! Signing, resetting, deleting and importing all take a [`StaffSession`],
//! which can only be obtained by passing a [`StaffAuthenticator`] check. The
//! bundled authenticator compares a shared numeric PIN; anything stronger can
//! be plugged in through the trait.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use storage::repository::SettingsRepository;

use crate::Clock;
use crate::error::StaffError;

/// PIN accepted when none has been configured.
pub const DEFAULT_STAFF_PIN: &str = "1234";

const PIN_LEN: std::ops::RangeInclusive<usize> = 4..=8;

/// Decides whether a staff credential is valid.
pub trait StaffAuthenticator: Send + Sync {
    /// # Errors
    ///
    /// Returns `StaffError::WrongPin` (or a format error) when the credential is rejected.
    fn verify(&self, credential: &str) -> Result<(), StaffError>;
}

/// Proof that staff access was granted. Only constructed by [`StaffService`].
#[derive(Debug, Clone)]
pub struct StaffSession {
    unlocked_at: DateTime<Utc>,
}

impl StaffSession {
    #[must_use]
    pub fn unlocked_at(&self) -> DateTime<Utc> {
        self.unlocked_at
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            unlocked_at: checklist_core::time::fixed_now(),
        }
    }
}

/// Checks a shared numeric PIN.
#[derive(Debug, Clone)]
pub struct PinAuthenticator {
    pin: String,
}

impl PinAuthenticator {
    /// # Errors
    ///
    /// Returns `StaffError::InvalidPinLength` or `StaffError::InvalidPinFormat`
    /// if `pin` is not 4 to 8 digits.
    pub fn new(pin: &str) -> Result<Self, StaffError> {
        Ok(Self {
            pin: validate_pin(pin)?,
        })
    }
}

impl StaffAuthenticator for PinAuthenticator {
    fn verify(&self, credential: &str) -> Result<(), StaffError> {
        let candidate = validate_pin(credential)?;
        if candidate == self.pin {
            Ok(())
        } else {
            Err(StaffError::WrongPin)
        }
    }
}

/// Trims a PIN and checks its shape.
///
/// # Errors
///
/// Returns `StaffError::InvalidPinLength` or `StaffError::InvalidPinFormat`.
pub fn validate_pin(pin: &str) -> Result<String, StaffError> {
    let pin = pin.trim();
    let len = pin.chars().count();
    if !PIN_LEN.contains(&len) {
        return Err(StaffError::InvalidPinLength { len });
    }
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(StaffError::InvalidPinFormat);
    }
    Ok(pin.to_owned())
}

/// Grants staff sessions and manages the stored PIN.
#[derive(Clone)]
pub struct StaffService {
    clock: Clock,
    settings: Arc<dyn SettingsRepository>,
}

impl StaffService {
    #[must_use]
    pub fn new(clock: Clock, settings: Arc<dyn SettingsRepository>) -> Self {
        Self { clock, settings }
    }

    /// The authenticator for the stored PIN, or the default one.
    ///
    /// # Errors
    ///
    /// Returns `StaffError::Storage` if settings cannot be read, or a format
    /// error if the stored PIN is unusable.
    pub async fn authenticator(&self) -> Result<PinAuthenticator, StaffError> {
        match self.settings.get_staff_pin().await? {
            Some(pin) => PinAuthenticator::new(&pin),
            None => {
                tracing::warn!("no staff PIN configured, falling back to the default PIN");
                PinAuthenticator::new(DEFAULT_STAFF_PIN)
            }
        }
    }

    /// Check `pin` against the stored PIN.
    ///
    /// # Errors
    ///
    /// Returns `StaffError::WrongPin` for a mismatch.
    pub async fn unlock(&self, pin: &str) -> Result<StaffSession, StaffError> {
        let auth = self.authenticator().await?;
        self.unlock_with(&auth, pin)
    }

    /// Check `credential` with any authenticator.
    ///
    /// # Errors
    ///
    /// Propagates the authenticator's rejection.
    pub fn unlock_with(
        &self,
        auth: &dyn StaffAuthenticator,
        credential: &str,
    ) -> Result<StaffSession, StaffError> {
        if let Err(err) = auth.verify(credential) {
            tracing::warn!(error = %err, "staff unlock rejected");
            return Err(err);
        }
        Ok(StaffSession {
            unlocked_at: self.clock.now(),
        })
    }

    /// Replace the stored PIN.
    ///
    /// # Errors
    ///
    /// Returns a format error for an invalid PIN and `StaffError::Storage` if
    /// it cannot be saved.
    pub async fn change_pin(&self, _staff: &StaffSession, new_pin: &str) -> Result<(), StaffError> {
        let pin = validate_pin(new_pin)?;
        self.settings.save_staff_pin(&pin).await?;
        tracing::info!("staff PIN changed");
        Ok(())
    }
}
