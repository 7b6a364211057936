//! Client-side checks run before anything is sent to the trip server
use crate::range::DateRange;
use crate::trip::{
    is_long_enough_destination, Confirmation, NewActivity, NewLink, NewTrip, TripUpdate,
    MIN_DESTINATION_LEN,
};
use crate::validate::{is_valid_email, is_valid_url};
use thiserror::Error;
use time::{Date, Time};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum FormError {
    #[error("all fields must be filled in")]
    Incomplete,
    #[error("destination must be at least {} characters long", MIN_DESTINATION_LEN)]
    DestinationTooShort,
    #[error("invalid email address {0:?}")]
    InvalidEmail(String),
    #[error("{0:?} has already been invited")]
    DuplicateEmail(String),
    #[error("invalid link {0:?}")]
    InvalidUrl(String),
    #[error("invalid hour {0:?}; expected a number from 0 to 23")]
    InvalidHour(String),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum Step {
    #[default]
    TripDetails,
    AddEmails,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Advance {
    /// The form moved on to its next step
    Next(Step),
    /// The form is complete
    Submit(NewTrip),
}

/// State of the "new trip" form: destination and dates first, then the
/// guests to invite
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct NewTripForm {
    destination: String,
    dates: DateRange,
    emails: Vec<String>,
    step: Step,
}

impl NewTripForm {
    pub(crate) fn new() -> NewTripForm {
        NewTripForm::default()
    }

    pub(crate) fn dates(&self) -> DateRange {
        self.dates
    }

    pub(crate) fn emails(&self) -> &[String] {
        &self.emails
    }

    /// Destination and dates can only be changed while on the first step.
    /// Returns `false` if the change was not applied.
    pub(crate) fn set_destination<S: Into<String>>(&mut self, destination: S) -> bool {
        if self.step == Step::TripDetails {
            self.destination = destination.into();
            true
        } else {
            false
        }
    }

    pub(crate) fn set_dates(&mut self, dates: DateRange) -> bool {
        if self.step == Step::TripDetails {
            self.dates = dates;
            true
        } else {
            false
        }
    }

    pub(crate) fn add_email(&mut self, email: &str) -> Result<(), FormError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(FormError::InvalidEmail(email));
        }
        if self.emails.contains(&email) {
            return Err(FormError::DuplicateEmail(email));
        }
        self.emails.push(email);
        Ok(())
    }

    /// Returns `false` if `email` was not on the guest list
    pub(crate) fn remove_email(&mut self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        let before = self.emails.len();
        self.emails.retain(|e| *e != email);
        self.emails.len() != before
    }

    /// Return to the destination & dates step.  Guests are kept.
    pub(crate) fn back(&mut self) {
        self.step = Step::TripDetails;
    }

    pub(crate) fn guests_summary(&self) -> String {
        match self.emails.len() {
            0 => String::new(),
            n => format!("{n} guest(s) invited"),
        }
    }

    pub(crate) fn advance(&mut self) -> Result<Advance, FormError> {
        let Some((starts_at, ends_at)) = self.dates.endpoints() else {
            return Err(FormError::Incomplete);
        };
        if self.destination.trim().is_empty() {
            return Err(FormError::Incomplete);
        }
        if !is_long_enough_destination(&self.destination) {
            return Err(FormError::DestinationTooShort);
        }
        match self.step {
            Step::TripDetails => {
                self.step = Step::AddEmails;
                Ok(Advance::Next(self.step))
            }
            Step::AddEmails => Ok(Advance::Submit(NewTrip {
                destination: self.destination.trim().to_owned(),
                starts_at: starts_at.date(),
                ends_at: ends_at.date(),
                emails_to_invite: self.emails.clone(),
            })),
        }
    }
}

/// A line typed while on the guest step of a [`NewTripForm`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum GuestInput {
    /// A blank line: the guest list is finished
    Done,
    Invite(String),
    /// `-EMAIL`
    Uninvite(String),
    /// `<`: go back and change the destination or dates
    Back,
}

impl GuestInput {
    pub(crate) fn parse(line: &str) -> GuestInput {
        let line = line.trim();
        if line.is_empty() {
            GuestInput::Done
        } else if line == "<" {
            GuestInput::Back
        } else if let Some(email) = line.strip_prefix('-') {
            GuestInput::Uninvite(email.trim().to_owned())
        } else {
            GuestInput::Invite(line.to_owned())
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct UpdateTripForm {
    pub(crate) destination: String,
    pub(crate) dates: DateRange,
}

impl UpdateTripForm {
    pub(crate) fn validate(&self) -> Result<TripUpdate, FormError> {
        let destination = self.destination.trim();
        let Some((starts_at, ends_at)) = self.dates.endpoints() else {
            return Err(FormError::Incomplete);
        };
        if destination.is_empty() {
            return Err(FormError::Incomplete);
        }
        if !is_long_enough_destination(destination) {
            return Err(FormError::DestinationTooShort);
        }
        Ok(TripUpdate {
            destination: destination.to_owned(),
            starts_at: starts_at.date(),
            ends_at: ends_at.date(),
        })
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ActivityForm {
    pub(crate) title: String,
    pub(crate) date: Option<Date>,
    pub(crate) hour: String,
}

impl ActivityForm {
    pub(crate) fn validate(&self) -> Result<NewActivity, FormError> {
        let hour = self.hour.trim();
        let Some(date) = self.date else {
            return Err(FormError::Incomplete);
        };
        if self.title.trim().is_empty() || hour.is_empty() {
            return Err(FormError::Incomplete);
        }
        let time = hour
            .parse::<u8>()
            .ok()
            .and_then(|h| Time::from_hms(h, 0, 0).ok())
            .ok_or_else(|| FormError::InvalidHour(hour.to_owned()))?;
        Ok(NewActivity {
            title: self.title.clone(),
            occurs_at: date.with_time(time),
        })
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct LinkForm {
    pub(crate) title: String,
    pub(crate) url: String,
}

impl LinkForm {
    pub(crate) fn validate(&self) -> Result<NewLink, FormError> {
        let title = self.title.trim();
        let url = self.url.trim();
        if title.is_empty() {
            return Err(FormError::Incomplete);
        }
        if !is_valid_url(url) {
            return Err(FormError::InvalidUrl(url.to_owned()));
        }
        Ok(NewLink {
            title: title.to_owned(),
            url: url.to_owned(),
        })
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ConfirmForm {
    pub(crate) name: String,
    pub(crate) email: String,
}

impl ConfirmForm {
    pub(crate) fn validate(&self) -> Result<Confirmation, FormError> {
        let name = self.name.trim();
        let email = self.email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() {
            return Err(FormError::Incomplete);
        }
        if !is_valid_email(&email) {
            return Err(FormError::InvalidEmail(email));
        }
        Ok(Confirmation {
            name: name.to_owned(),
            email,
        })
    }
}
