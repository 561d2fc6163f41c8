use std::{str::FromStr, time::Duration};

use ::cucumber::{given, then, when};
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType},
    AccrualUpdate,
    OrderManagement,
    WithdrawalError,
};
use lp_common::Points;

use crate::{
    cucumber::LoyaltyWorld,
    support::{mock_provider::Reply, prepare_env::wait_until},
};

fn points(s: &str) -> Points {
    Points::from_str(s).unwrap_or_else(|e| panic!("{e}"))
}

fn status(s: &str) -> OrderStatusType {
    OrderStatusType::from_str(s).unwrap_or_else(|e| panic!("{e}"))
}

#[given(expr = "a user {string}")]
async fn create_user(world: &mut LoyaltyWorld, login: String) {
    let system = world.system().await;
    let user = system.accounts.create_user(&login, "hash").await.expect("Error creating user");
    system.users.insert(login, user.id);
}

#[given(expr = "a user {string} with a balance of {word} and {word} withdrawn")]
async fn user_with_balance(world: &mut LoyaltyWorld, login: String, balance: String, withdrawn: String) {
    create_user(world, login.clone()).await;
    let system = world.system().await;
    let user_id = system.user_id(&login);
    let (balance, withdrawn) = (points(&balance), points(&withdrawn));
    let number = OrderNumber::from(format!("earned-by-{login}"));
    system.orders.register_order(user_id, &number).await.expect("Error registering order");
    let update = AccrualUpdate::new(number, OrderStatusType::Processed).with_accrual(balance + withdrawn);
    system.orders.apply_accrual_result(update).await.expect("Error applying accrual");
    if withdrawn.is_positive() {
        system.withdrawals.withdraw(user_id, "spent-earlier", withdrawn).await.expect("Error withdrawing");
    }
}

#[given(expr = "the accrual system reports order {string} as {word}")]
async fn script_single(world: &mut LoyaltyWorld, number: String, reported: String) {
    let reply = match reported.as_str() {
        "UNKNOWN" => Reply::NotYetKnown,
        "FAILING" => Reply::Fail,
        s => Reply::Status(s.parse().expect("Invalid accrual status"), None),
    };
    world.system().await.provider.script(&number, vec![reply]);
}

#[given(expr = "the accrual system reports order {string} as PROCESSING, then PROCESSED with {word} points")]
async fn script_processing_then_processed(world: &mut LoyaltyWorld, number: String, accrual: String) {
    let replies = vec![Reply::processing(), Reply::processed(&accrual)];
    world.system().await.provider.script(&number, replies);
}

#[given(expr = "the accrual system has not heard of order {string} yet, then reports it as PROCESSED with {word} points")]
async fn script_unknown_then_processed(world: &mut LoyaltyWorld, number: String, accrual: String) {
    let replies = vec![Reply::NotYetKnown, Reply::NotYetKnown, Reply::processed(&accrual)];
    world.system().await.provider.script(&number, replies);
}

#[given(expr = "order {string} was stored for {string} before the restart")]
async fn store_order(world: &mut LoyaltyWorld, number: String, login: String) {
    let system = world.system().await;
    let user_id = system.user_id(&login);
    system.db.insert_order(user_id, &OrderNumber::from(number)).await.expect("Error storing order");
}

#[when(expr = "{string} registers order {string}")]
async fn register_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let system = world.system().await;
    let user_id = system.user_id(&login);
    system.orders.register_order(user_id, &OrderNumber::from(number)).await.expect("Error registering order");
}

#[when(expr = "{string} tries to register order {string}")]
async fn try_register_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let system = world.system().await;
    let user_id = system.user_id(&login);
    let result = system.orders.register_order(user_id, &OrderNumber::from(number)).await;
    assert!(result.is_err(), "Expected the registration to fail");
}

#[when("the accrual sync is running")]
async fn start_sync(world: &mut LoyaltyWorld) {
    world.system().await.start_sync();
}

#[when(expr = "{string} withdraws {word} for order {string}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, amount: String, number: String) {
    let system = world.system().await;
    let user_id = system.user_id(&login);
    system.last_withdrawal_error = system.withdrawals.withdraw(user_id, &number, points(&amount)).await.err();
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut LoyaltyWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "order {string} becomes {word} within {int} seconds")]
async fn order_becomes(world: &mut LoyaltyWorld, number: String, expected: String, secs: u64) {
    let system = world.system().await;
    let number = OrderNumber::from(number);
    let expected = status(&expected);
    let reached = wait_until(Duration::from_secs(secs), || async {
        let order = system.db.fetch_order(&number).await.expect("Error fetching order");
        order.map(|o| o.status) == Some(expected)
    })
    .await;
    assert!(reached, "Order {number} did not become {expected}");
}

#[then(expr = "order {string} is {word}")]
async fn order_is(world: &mut LoyaltyWorld, number: String, expected: String) {
    let system = world.system().await;
    let order = system.orders.order(&OrderNumber::from(number)).await.expect("Error fetching order");
    assert_eq!(order.map(|o| o.status), Some(status(&expected)));
}

#[then(expr = "order {string} belongs to {string}")]
async fn order_belongs_to(world: &mut LoyaltyWorld, number: String, login: String) {
    let system = world.system().await;
    let order = system.orders.order(&OrderNumber::from(number)).await.expect("Error fetching order");
    assert_eq!(order.map(|o| o.user_id), Some(system.user_id(&login)));
}

#[then(expr = "the balance of {string} is {word}")]
async fn balance_is(world: &mut LoyaltyWorld, login: String, expected: String) {
    let system = world.system().await;
    let balance = system.accounts.balance(system.user_id(&login)).await.expect("Error fetching balance");
    assert_eq!(balance.map(|b| b.current), Some(points(&expected)));
}

#[then(expr = "{string} has withdrawn {word} in total")]
async fn withdrawn_is(world: &mut LoyaltyWorld, login: String, expected: String) {
    let system = world.system().await;
    let balance = system.accounts.balance(system.user_id(&login)).await.expect("Error fetching balance");
    assert_eq!(balance.map(|b| b.withdrawn), Some(points(&expected)));
}

#[then(expr = "{string} has {int} withdrawal(s)")]
async fn withdrawal_count(world: &mut LoyaltyWorld, login: String, expected: usize) {
    let system = world.system().await;
    let history = system.accounts.withdrawals_for_user(system.user_id(&login)).await.expect("Error fetching history");
    assert_eq!(history.len(), expected);
}

#[then(expr = "the latest withdrawal of {string} is {word} for order {string}")]
async fn latest_withdrawal(world: &mut LoyaltyWorld, login: String, amount: String, number: String) {
    let system = world.system().await;
    let history = system.accounts.withdrawals_for_user(system.user_id(&login)).await.expect("Error fetching history");
    let latest = history.first().expect("No withdrawals");
    assert_eq!(latest.amount, points(&amount));
    assert_eq!(latest.order_number, number);
}

#[then("the withdrawal is rejected for insufficient funds")]
async fn rejected_for_insufficient_funds(world: &mut LoyaltyWorld) {
    let system = world.system().await;
    assert!(
        matches!(system.last_withdrawal_error, Some(WithdrawalError::InsufficientFunds { .. })),
        "Expected insufficient funds, got {:?}",
        system.last_withdrawal_error
    );
}

#[then(expr = "the accrual system was asked about order {string} {int} time(s)")]
async fn lookup_count(world: &mut LoyaltyWorld, number: String, expected: usize) {
    let system = world.system().await;
    assert_eq!(system.provider.lookups(&number), expected);
}
