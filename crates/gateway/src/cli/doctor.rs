use mon_domain::config::{Config, ConfigSeverity};
use mon_probe::browser::chromium::ChromiumPool;

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("mon-gateway doctor");
    println!("==================\n");

    let mut all_passed = true;

    check_config_file(config_path, &mut all_passed);
    check_config_validation(config, &mut all_passed);
    check_port_bindable(config, &mut all_passed).await;
    check_browser_launchable(config).await;

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn check_config_file(config_path: &str, all_passed: &mut bool) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
    if !exists {
        *all_passed = false;
    }
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({error_count} error(s))", issues.len()),
        );
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

async fn check_port_bindable(config: &Config, all_passed: &mut bool) {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let bindable = tokio::net::TcpListener::bind(&addr).await.is_ok();
    print_check(
        "Server address bindable",
        bindable,
        if bindable {
            addr
        } else {
            format!("{addr} (already in use or unreachable)")
        },
    );
    if !bindable {
        *all_passed = false;
    }
}

/// Best-effort: a missing headless Chrome binary is a warning, not a
/// failure, since the HTTP-only probe pipeline still works without it.
async fn check_browser_launchable(config: &Config) {
    match ChromiumPool::launch(&config.browser).await {
        Ok(_) => print_check("Headless browser launchable", true, "ready".into()),
        Err(e) => print_check(
            "Headless browser launchable",
            false,
            format!("{e} (debug sessions will fail until resolved)"),
        ),
    }
}

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
