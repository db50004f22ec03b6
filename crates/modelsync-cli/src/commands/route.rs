//! Route command handler

use anyhow::{bail, Result};

use modelsync_core::Router;

use crate::output::Output;

/// Application routes: the users page, and a catch-all for everything else
pub fn app_router() -> Router {
    Router::new()
        .route("users", "showUsers")
        .route("*actions", "defaultAction")
}

/// Dispatch a fragment through the application routes
pub fn dispatch(fragment: &str, output: &Output) -> Result<()> {
    let mut router = app_router();

    let out = *output;
    router.on_route("showUsers", move |_, _| out.notice("Show a list of users"));
    router.on_route("defaultAction", move |_, event| {
        let unknown = event.args.first().map(String::as_str).unwrap_or_default();
        out.notice(&format!("We don't recognize this route: {}", unknown));
    });

    match router.navigate(fragment) {
        Some(event) => {
            output.print_route(&event);
            Ok(())
        }
        None => bail!("No route matches '{}'", fragment),
    }
}
