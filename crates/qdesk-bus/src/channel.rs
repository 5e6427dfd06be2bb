// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription channel names.

use std::fmt;
use std::str::FromStr;

use qdesk_core::{QdeskError, RoomId};

/// A fan-out target. Parsed from and printed as `room:3`, `ticket:XN-0001`,
/// `dashboard`, `all_rooms` or `display:lobby`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Room(RoomId),
    Ticket(String),
    Dashboard,
    AllRooms,
    Display(String),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room(id) => write!(f, "room:{id}"),
            Self::Ticket(number) => write!(f, "ticket:{number}"),
            Self::Dashboard => f.write_str("dashboard"),
            Self::AllRooms => f.write_str("all_rooms"),
            Self::Display(id) => write!(f, "display:{id}"),
        }
    }
}

impl FromStr for Channel {
    type Err = QdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QdeskError::Rejected {
            message: format!("unknown channel `{s}`"),
        };
        match s.split_once(':') {
            None => match s {
                "dashboard" => Ok(Self::Dashboard),
                "all_rooms" => Ok(Self::AllRooms),
                _ => Err(invalid()),
            },
            Some((_, "")) => Err(invalid()),
            Some(("room", id)) => id.parse().map(Self::Room).map_err(|_| invalid()),
            Some(("ticket", number)) => Ok(Self::Ticket(number.to_string())),
            Some(("display", id)) => Ok(Self::Display(id.to_string())),
            Some(_) => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_form() {
        assert_eq!("room:12".parse::<Channel>().unwrap(), Channel::Room(12));
        assert_eq!(
            "ticket:XN-U0001".parse::<Channel>().unwrap(),
            Channel::Ticket("XN-U0001".into())
        );
        assert_eq!("dashboard".parse::<Channel>().unwrap(), Channel::Dashboard);
        assert_eq!("all_rooms".parse::<Channel>().unwrap(), Channel::AllRooms);
        assert_eq!(
            "display:lobby".parse::<Channel>().unwrap(),
            Channel::Display("lobby".into())
        );
    }

    #[test]
    fn display_round_trips() {
        for channel in [
            Channel::Room(4),
            Channel::Ticket("KB-0003".into()),
            Channel::Dashboard,
            Channel::AllRooms,
            Channel::Display("tv-1".into()),
        ] {
            assert_eq!(channel.to_string().parse::<Channel>().unwrap(), channel);
        }
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "room:", "room:abc", "lobby", "queue:1", "ticket:"] {
            assert!(bad.parse::<Channel>().is_err(), "{bad} should be rejected");
        }
    }
}
