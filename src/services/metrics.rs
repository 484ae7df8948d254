use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    pub static ref RECIPES_COOKED_COUNTER: CounterVec = register_counter_vec!(
        "recipes_cooked_total",
        "Cook and undo-cook operations",
        &["direction"]
    ).unwrap();

    pub static ref RECIPES_CREATED_COUNTER: Counter = register_counter!(
        "recipes_created_total",
        "Recipes created"
    ).unwrap();

    pub static ref PLAN_ACTIONS_COUNTER: CounterVec = register_counter_vec!(
        "plan_actions_total",
        "Plan actions applied, by action",
        &["action"]
    ).unwrap();

    pub static ref PLAN_RECONCILED_COUNTER: Counter = register_counter!(
        "plan_entries_reconciled_total",
        "Plan entries repointed to the plan matching their date"
    ).unwrap();
}
