//! Pricing engine (§4.13): a load→multiplier curve over a fixed base price.

use ec_proto::ResourceClass;

fn base_price(resource_class: ResourceClass) -> f64 {
    match resource_class {
        ResourceClass::Cpu => 30.0,
        ResourceClass::Gpu => 120.0,
    }
}

/// `price_per_unit(resource_class, queued_tasks, active_agents, capacity)` (§4.13).
pub fn price_per_unit(
    resource_class: ResourceClass,
    queued_tasks: u64,
    active_agents: u64,
    capacity: f64,
) -> u64 {
    let demand = (queued_tasks + active_agents).max(1) as f64;
    let scarcity = demand / capacity.max(1e-9);
    let multiplier = (0.65 + scarcity * 0.35).clamp(0.35, 4.0);
    let price = (base_price(resource_class) * multiplier).round();
    price.max(1.0) as u64
}
