//! Field table mapping etcd keys onto [`NodeInfo`]
//!
//! Each entry names the etcd field, how to store a raw value into a record
//! and how to render it back. The loader and the override report both walk
//! this table.

use std::fmt::Display;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use ipnet::{Ipv4Net, Ipv6Net};

use super::node::NodeInfo;

/// One mapped field of a node record
pub struct NodeField {
    /// Name of the field as the last etcd key component
    pub name: &'static str,
    /// Store a raw value into the record
    pub parse: fn(&mut NodeInfo, &str) -> Result<(), String>,
    /// Current value of the field, if set
    pub render: fn(&NodeInfo) -> Option<String>,
}

/// All fields of a node record
pub static NODE_FIELDS: &[NodeField] = &[
    NodeField {
        name: "id",
        parse: |node, raw| {
            node.id = Some(parse_number(raw)?);
            Ok(())
        },
        render: |node| node.id.map(|v| v.to_string()),
    },
    NodeField {
        name: "mtu",
        parse: |node, raw| {
            node.mtu = Some(parse_number(raw)?);
            Ok(())
        },
        render: |node| node.mtu.map(|v| v.to_string()),
    },
    NodeField {
        name: "address4",
        parse: |node, raw| {
            node.address4 = Some(validated::<Ipv4Addr>(raw)?);
            Ok(())
        },
        render: |node| node.address4.clone(),
    },
    NodeField {
        name: "range4",
        parse: |node, raw| {
            node.range4 = Some(validated::<Ipv4Net>(raw)?);
            Ok(())
        },
        render: |node| node.range4.clone(),
    },
    NodeField {
        name: "address6",
        parse: |node, raw| {
            node.address6 = Some(validated::<Ipv6Addr>(raw)?);
            Ok(())
        },
        render: |node| node.address6.clone(),
    },
    NodeField {
        name: "range6",
        parse: |node, raw| {
            node.range6 = Some(validated::<Ipv6Net>(raw)?);
            Ok(())
        },
        render: |node| node.range6.clone(),
    },
    NodeField {
        name: "wg_keepalive",
        parse: |node, raw| {
            node.wg_keepalive = Some(parse_number(raw)?);
            Ok(())
        },
        render: |node| node.wg_keepalive.map(|v| v.to_string()),
    },
    NodeField {
        name: "concentrators",
        parse: |node, raw| {
            serde_json::from_str::<serde_json::Value>(raw).map_err(|e| e.to_string())?;
            node.concentrators = Some(raw.to_string());
            Ok(())
        },
        render: |node| node.concentrators.clone(),
    },
];

/// Look up a field by its etcd name
#[must_use]
pub fn find_field(name: &str) -> Option<&'static NodeField> {
    NODE_FIELDS.iter().find(|field| field.name == name)
}

fn parse_number<T: FromStr>(raw: &str) -> Result<T, String>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| e.to_string())
}

/// Check that `raw` parses as `T` and keep its trimmed text
fn validated<T: FromStr>(raw: &str) -> Result<String, String>
where
    T::Err: Display,
{
    let value = raw.trim();
    value
        .parse::<T>()
        .map_err(|e| format!("'{value}': {e}"))?;
    Ok(value.to_string())
}
