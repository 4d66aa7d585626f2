use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("jsonguard {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: jsonguard");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("policy: {}", jsonguard_policy::POLICY_ID);
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("JSONGUARD_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("JSONGUARD_BUILD_PROFILE").unwrap_or("unknown")
    );

    Ok(SUCCESS)
}
