//! Server field validation.
//!
//! Checks run in three stages and every error of a stage is collected:
//! 1. address policy (customer, name, address syntax and range),
//! 2. pool membership through the allocator,
//! 3. uniqueness against active servers.
//!
//! A stage only runs when every earlier stage came back clean.

use crate::allocator::AddressAllocator;
use crate::models::{AddressKind, Ipv4, ServerInput, ServerRecord};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// A single reason a server cannot be saved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("customer required")]
    CustomerRequired,
    #[error("server name required")]
    NameRequired,
    #[error("internal IP '{0}' is not a valid IPv4 address")]
    InvalidInternalIp(String),
    #[error("internal IP {ip} out of range {range}")]
    InternalIpOutOfRange { ip: String, range: Ipv4 },
    #[error("WAN IP '{0}' is not a valid IP address")]
    InvalidWanIp(String),
    #[error("internal and WAN IP identical")]
    IdenticalAddresses,
    #[error("internal IP {ip} is not available for host '{host}'")]
    InternalIpNotInPool { ip: String, host: String },
    #[error("WAN IP {0} is outside the configured WAN subnets")]
    WanIpNotInPool(String),
    #[error("internal IP {0} already in use")]
    InternalIpInUse(String),
    #[error("WAN IP {0} already in use")]
    WanIpInUse(String),
}

/// Every error found before validation stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Human-readable messages, one per error.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// What validation needs to know about the rest of the system.
pub struct ValidationContext<'a> {
    pub allocator: &'a AddressAllocator<'a>,
    /// All stored servers; only active ones count for uniqueness.
    pub servers: &'a [ServerRecord],
    pub internal_range: Ipv4,
}

/// Validate a server before it is inserted, or updated when `exclude_id` is set.
pub fn validate_server(
    input: &ServerInput,
    exclude_id: Option<u64>,
    ctx: &ValidationContext,
) -> Result<(), ValidationErrors> {
    let input = input.trimmed();

    let errors = address_policy_errors(&input, ctx.internal_range);
    if !errors.is_empty() {
        log::debug!("validate_server: address policy failed: {:?}", errors);
        return Err(ValidationErrors(errors));
    }

    let errors = pool_errors(&input, ctx.allocator);
    if !errors.is_empty() {
        log::debug!("validate_server: pool check failed: {:?}", errors);
        return Err(ValidationErrors(errors));
    }

    let errors = duplicate_errors(&input, exclude_id, ctx.servers);
    if !errors.is_empty() {
        log::debug!("validate_server: duplicates found: {:?}", errors);
        return Err(ValidationErrors(errors));
    }

    Ok(())
}

fn address_policy_errors(input: &ServerInput, internal_range: Ipv4) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if input.customer_id == 0 {
        errors.push(ValidationError::CustomerRequired);
    }
    if input.server_name.is_empty() {
        errors.push(ValidationError::NameRequired);
    }

    match input.ip_internal.parse::<Ipv4Addr>() {
        Ok(ip) if internal_range.contains(ip) => {}
        Ok(_) => errors.push(ValidationError::InternalIpOutOfRange {
            ip: input.ip_internal.clone(),
            range: internal_range,
        }),
        Err(_) => errors.push(ValidationError::InvalidInternalIp(input.ip_internal.clone())),
    }

    if input.ip_wan.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidWanIp(input.ip_wan.clone()));
    }

    if input.ip_internal == input.ip_wan {
        errors.push(ValidationError::IdenticalAddresses);
    }

    errors
}

fn pool_errors(input: &ServerInput, allocator: &AddressAllocator) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let host = input.host.as_deref();

    if !allocator.is_address_allowed(AddressKind::Internal, &input.ip_internal, host) {
        errors.push(ValidationError::InternalIpNotInPool {
            ip: input.ip_internal.clone(),
            host: host.unwrap_or("").to_string(),
        });
    }
    if !allocator.is_address_allowed(AddressKind::Wan, &input.ip_wan, None) {
        errors.push(ValidationError::WanIpNotInPool(input.ip_wan.clone()));
    }

    errors
}

fn duplicate_errors(
    input: &ServerInput,
    exclude_id: Option<u64>,
    servers: &[ServerRecord],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut others = servers
        .iter()
        .filter(|s| s.is_active() && Some(s.id) != exclude_id);

    if others
        .clone()
        .any(|s| s.ip_internal.trim() == input.ip_internal)
    {
        errors.push(ValidationError::InternalIpInUse(input.ip_internal.clone()));
    }
    if others.any(|s| s.ip_wan.trim() == input.ip_wan) {
        errors.push(ValidationError::WanIpInUse(input.ip_wan.clone()));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InternalIpPoolEntry, WanPoolEntry};
    use chrono::Utc;

    fn range() -> Ipv4 {
        Ipv4::new("172.16.0.0/16").unwrap()
    }

    fn record(id: u64, internal: &str, wan: &str, deleted: bool) -> ServerRecord {
        let now = Utc::now();
        ServerRecord {
            id,
            customer_id: 1,
            server_name: format!("srv-{id}"),
            ip_internal: internal.to_string(),
            ip_wan: wan.to_string(),
            host: None,
            farm: None,
            is_deleted: deleted,
            deleted_at: if deleted { Some(now) } else { None },
            created_at: now,
            updated_at: now,
        }
    }

    fn input(customer_id: u64, name: &str, internal: &str, wan: &str) -> ServerInput {
        ServerInput {
            customer_id,
            server_name: name.to_string(),
            ip_internal: internal.to_string(),
            ip_wan: wan.to_string(),
            host: None,
            farm: None,
        }
    }

    #[test]
    fn test_policy_stage_collects_everything() {
        let servers = vec![record(1, "10.0.0.1", "10.0.0.1", false)];
        let internal = vec![InternalIpPoolEntry::new("172.16.0.9", None)];
        let alloc = AddressAllocator::new(&internal, &[]);
        let ctx = ValidationContext {
            allocator: &alloc,
            servers: &servers,
            internal_range: range(),
        };

        let errors = validate_server(&input(0, "  ", "10.0.0.1", "10.0.0.1"), None, &ctx)
            .unwrap_err();
        assert!(errors.contains(&ValidationError::CustomerRequired));
        assert!(errors.contains(&ValidationError::NameRequired));
        assert!(errors.contains(&ValidationError::InternalIpOutOfRange {
            ip: "10.0.0.1".into(),
            range: range()
        }));
        assert!(errors.contains(&ValidationError::IdenticalAddresses));
        assert_eq!(errors.len(), 4, "no pool or duplicate checks: {errors}");
    }

    #[test]
    fn test_policy_rejects_bad_syntax() {
        let alloc = AddressAllocator::new(&[], &[]);
        let ctx = ValidationContext {
            allocator: &alloc,
            servers: &[],
            internal_range: range(),
        };
        let errors = validate_server(&input(1, "a", "172.16.0.300", "not-an-ip"), None, &ctx)
            .unwrap_err();
        assert_eq!(
            errors.0,
            vec![
                ValidationError::InvalidInternalIp("172.16.0.300".into()),
                ValidationError::InvalidWanIp("not-an-ip".into()),
            ]
        );
    }

    #[test]
    fn test_wan_may_be_ipv6_without_wan_pool() {
        let alloc = AddressAllocator::new(&[], &[]);
        let ctx = ValidationContext {
            allocator: &alloc,
            servers: &[],
            internal_range: range(),
        };
        // IPv6 passes syntax but the WAN pool check only accepts IPv4.
        let errors = validate_server(&input(1, "a", "172.16.0.3", "2001:db8::1"), None, &ctx)
            .unwrap_err();
        assert_eq!(
            errors.0,
            vec![ValidationError::WanIpNotInPool("2001:db8::1".into())]
        );
    }

    #[test]
    fn test_pool_stage_stops_before_duplicates() {
        let servers = vec![record(1, "172.16.0.5", "8.8.8.2", false)];
        let internal = vec![InternalIpPoolEntry::new("172.16.0.5", Some("HostA"))];
        let wan = vec![WanPoolEntry::new("8.8.8.0/29")];
        let alloc = AddressAllocator::new(&internal, &wan);
        let ctx = ValidationContext {
            allocator: &alloc,
            servers: &servers,
            internal_range: range(),
        };

        let mut candidate = input(1, "web", "172.16.0.5", "8.8.9.2");
        candidate.host = Some("HostB".into());
        let errors = validate_server(&candidate, None, &ctx).unwrap_err();
        assert_eq!(
            errors.0,
            vec![
                ValidationError::InternalIpNotInPool {
                    ip: "172.16.0.5".into(),
                    host: "HostB".into()
                },
                ValidationError::WanIpNotInPool("8.8.9.2".into()),
            ]
        );
    }

    #[test]
    fn test_duplicates_reported_separately() {
        let servers = vec![
            record(1, "172.16.0.5", "8.8.8.2", false),
            record(2, "172.16.0.6", "8.8.8.3", false),
        ];
        let alloc = AddressAllocator::new(&[], &[]);
        let ctx = ValidationContext {
            allocator: &alloc,
            servers: &servers,
            internal_range: range(),
        };

        let errors = validate_server(&input(1, "web", "172.16.0.5", "8.8.8.3"), None, &ctx)
            .unwrap_err();
        assert_eq!(
            errors.0,
            vec![
                ValidationError::InternalIpInUse("172.16.0.5".into()),
                ValidationError::WanIpInUse("8.8.8.3".into()),
            ]
        );
    }

    #[test]
    fn test_duplicates_ignore_self_and_trash() {
        let servers = vec![
            record(1, "172.16.0.5", "8.8.8.2", false),
            record(2, "172.16.0.6", "8.8.8.3", true),
        ];
        let alloc = AddressAllocator::new(&[], &[]);
        let ctx = ValidationContext {
            allocator: &alloc,
            servers: &servers,
            internal_range: range(),
        };

        assert!(validate_server(&input(1, "web", "172.16.0.5", "8.8.8.2"), Some(1), &ctx).is_ok());
        assert!(validate_server(&input(1, "web", "172.16.0.6", "8.8.8.3"), None, &ctx).is_ok());
    }

    #[test]
    fn test_errors_display_joined() {
        let errors = ValidationErrors(vec![
            ValidationError::CustomerRequired,
            ValidationError::NameRequired,
        ]);
        assert_eq!(errors.to_string(), "customer required; server name required");
    }
}
