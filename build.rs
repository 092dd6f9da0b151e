use vergen::Emitter;
use vergen_git2::Git2Builder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `--version` only reads VERGEN_GIT_DESCRIBE.
    let git2_result = Git2Builder::default().describe(true, true, None).build();

    if let Ok(git2) = git2_result {
        Emitter::default().add_instructions(&git2)?.emit()?;
    } else {
        // Packaged builds have no repository.
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
    }

    Ok(())
}
