//! Record variants of the reservation system.
//!
//! Each type orders itself by its key fields only, so a key-only probe built
//! with `key(..)` finds the full record stored in a tree.

use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};

use serde::Serialize;

use crate::primitives::bytes::{Reader, Writer};
use crate::storage::record::Record;
use crate::types::{Result, StoreError};

/// Seat value of a customer without an assigned seat.
pub const NO_SEAT: i32 = -1;

/// A flight and its seat capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flight {
    /// Flight identifier; the ordering key.
    pub id: String,
    /// Number of seats on the aircraft.
    pub seats: i32,
}

impl Flight {
    /// Builds a flight, rejecting a negative seat count.
    pub fn new(id: impl Into<String>, seats: i32) -> Result<Self> {
        if seats < 0 {
            return Err(StoreError::Invalid(format!(
                "seat count must be non-negative, got {seats}"
            )));
        }
        Ok(Self {
            id: id.into(),
            seats,
        })
    }

    /// Key-only probe.
    pub fn key(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seats: 0,
        }
    }
}

impl Record for Flight {
    fn compare(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }

    fn blank(&self) -> Self {
        Flight::key(String::new())
    }

    fn save<W: Write>(&self, out: &mut Writer<W>) -> Result<()> {
        out.put_str(&self.id)?;
        out.put_i32(self.seats)
    }

    fn load<R: Read>(&mut self, src: &mut Reader<R>) -> Result<()> {
        self.id = src.get_string()?;
        self.seats = src.get_i32()?;
        Ok(())
    }
}

/// A passenger, identified by name and phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// Full name; primary ordering key.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Phone number; breaks ties between equal names.
    pub phone: String,
    /// Flight the customer is booked on, empty if none.
    pub flight_id: String,
    /// Assigned seat, or [`NO_SEAT`].
    pub seat: i32,
}

impl Customer {
    /// Key-only probe.
    pub fn key(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            phone: phone.into(),
            flight_id: String::new(),
            seat: NO_SEAT,
        }
    }

    /// Whether a seat has been assigned.
    pub fn has_seat(&self) -> bool {
        self.seat != NO_SEAT
    }
}

impl Default for Customer {
    fn default() -> Self {
        Customer::key(String::new(), String::new())
    }
}

impl Record for Customer {
    fn compare(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.phone.cmp(&other.phone))
    }

    fn blank(&self) -> Self {
        Customer::default()
    }

    fn save<W: Write>(&self, out: &mut Writer<W>) -> Result<()> {
        out.put_str(&self.name)?;
        out.put_str(&self.address)?;
        out.put_str(&self.phone)?;
        out.put_str(&self.flight_id)?;
        out.put_i32(self.seat)
    }

    fn load<R: Read>(&mut self, src: &mut Reader<R>) -> Result<()> {
        self.name = src.get_string()?;
        self.address = src.get_string()?;
        self.phone = src.get_string()?;
        self.flight_id = src.get_string()?;
        self.seat = src.get_i32()?;
        Ok(())
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.name, self.address, self.phone)
    }
}
