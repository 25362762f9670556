/// quick start - deposit collateral and borrow against it
use collateral_ledger::{
    AccountId, AdminSet, Amount, AssetId, LedgerConfig, LendingEngine, MemoryCustody,
    SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let admin = AccountId::new();
    let treasury = AccountId::new();
    let alice = AccountId::new();

    // 5% yearly, liquidation above 120% of collateral value
    let config = LedgerConfig::builder()
        .yearly_interest_percent(5)
        .default_threshold_percent(120)
        .treasury(treasury)
        .build()?;

    let mut custody = MemoryCustody::new();
    custody.fund(alice, "WETH", Amount::new(20))?;
    custody.fund_pool("USD", Amount::new(1_000))?;

    let mut engine = LendingEngine::new(config, custody, AdminSet::new([admin]))?;
    engine.add_asset(admin, "WETH", AccountId::NULL, 5, 18, &time)?;

    // 20 WETH at ratio 5 allows borrowing up to 100 USD
    let weth = AssetId::from("WETH");
    engine.add_collateral(alice, &weth, Amount::new(20), &time)?;
    let loan = engine.borrow(alice, Amount::new(40), &time)?;
    println!("borrowed {}, {} still available", loan.disbursed, loan.available_credit);

    println!("{}", engine.account_view(alice, &time)?.to_json());

    Ok(())
}
