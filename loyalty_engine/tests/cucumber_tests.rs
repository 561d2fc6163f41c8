mod cucumber;
mod support;

use ::cucumber::{codegen::LocalBoxFuture, event::ScenarioFinished, gherkin, writer, World};
use futures_util::FutureExt;
use log::*;
use tokio::runtime::Runtime;

use crate::{cucumber::LoyaltyWorld, support::prepare_env::remove_database};

fn main() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let sys = Runtime::new().expect("Could not start the tokio runtime");
    sys.block_on(
        LoyaltyWorld::cucumber()
            .with_writer(writer::Libtest::or_basic())
            .after(|_f, _r, scenario, ev, w| post_test_hook(scenario, ev, w))
            .run_and_exit("tests/features"),
    );
    info!("🚀️ Tests complete");
}

fn post_test_hook<'a>(
    scenario: &'a gherkin::Scenario,
    ev: &'a ScenarioFinished,
    world: Option<&'a mut LoyaltyWorld>,
) -> LocalBoxFuture<'a, ()> {
    let fut = async move {
        trace!("🚀️ After-scenario hook running for \"{}\"", scenario.name);
        let Some(mut system) = world.and_then(|w| w.system.take()) else {
            warn!("🚀️ World was not specified. Cannot cleanup database.");
            return;
        };
        let db_path = system.db.url().to_string();
        match ev {
            ScenarioFinished::StepPassed => {
                debug!("🚀️ Scenario complete, removing database: {db_path}");
                system.shutdown().await;
                remove_database(system.db).await;
            },
            _ => error!("🚀️ Error in scenario, database retained: {db_path}"),
        }
        trace!("🚀️ After-scenario hook complete");
    };
    fut.boxed_local()
}
