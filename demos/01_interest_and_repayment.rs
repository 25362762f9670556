/// interest and repayment - accrue with controlled time, then repay in kind
use chrono::{Duration, TimeZone, Utc};
use collateral_ledger::{
    AccountId, AdminSet, Amount, AssetId, LedgerConfig, LendingEngine, MemoryCustody,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== interest and repayment example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let admin = AccountId::new();
    let treasury = AccountId::new();
    let alice = AccountId::new();
    let token = |n: u128| Amount::from_whole(n, 18).unwrap_or(Amount::MAX);

    let config = LedgerConfig::builder()
        .yearly_interest_percent(10)
        .treasury(treasury)
        .build()?;

    let mut custody = MemoryCustody::new();
    custody.fund(alice, "WETH", token(20))?;
    custody.fund_pool("USD", token(1_000))?;

    let mut engine = LendingEngine::new(config, custody, AdminSet::new([admin]))?;
    engine.add_asset(admin, "WETH", AccountId::NULL, 5, 18, &time)?;

    let weth = AssetId::from("WETH");
    let opened = engine.add_collateral_and_borrow(alice, &weth, token(20), token(40), &time)?;
    println!("started on {}", time.now().format("%Y-%m-%d"));
    println!("debt: {}", opened.borrow.outstanding_debt);

    // a week passes
    controller.advance(Duration::days(7));
    println!("\nadvanced to: {}", time.now().format("%Y-%m-%d"));
    println!("debt due: {}", engine.debt_due(&alice, &time)?);
    println!("stored debt: {}", engine.outstanding_debt(&alice));

    // borrowing again capitalizes the week's interest first
    let more = engine.borrow(alice, token(10), &time)?;
    println!("\ninterest capitalized: {}", more.interest_capitalized);
    println!("debt after second loan: {}", more.outstanding_debt);

    // a year later, repay with two WETH (worth 10 USD)
    controller.advance(Duration::days(365));
    let repayment = engine.repay_loan(alice, &weth, token(2), &time)?;
    println!("\nadvanced to: {}", time.now().format("%Y-%m-%d"));
    println!("to interest: {}", repayment.to_interest);
    println!("to principal: {}", repayment.to_principal);
    println!("remaining debt: {}", repayment.outstanding_debt);
    println!("treasury received {} WETH", engine.custody().wallet(&treasury, &weth));

    Ok(())
}
