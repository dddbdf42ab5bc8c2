use cirrusfs::fuse::DriveFuse;
use cirrusfs::fuse::mount::mount_unprivileged;
use cirrusfs::remote::MemoryRemote;
use cirrusfs::vfs::DriveFs;
use cirrusfs::vfs::demo::e2e_memory_demo;

use log::info;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("demo") => match e2e_memory_demo().await {
            Ok(()) => println!("demo: OK"),
            Err(e) => {
                eprintln!("demo failed: {e}");
                std::process::exit(1);
            }
        },
        Some("mount-mem") => {
            let mount_point = match args.next() {
                Some(p) => p,
                None => {
                    eprintln!(
                        "Usage: cirrusfs mount-mem <mount_point>\n\n  mount_point: empty directory to mount an in-memory drive\n\nExample:\n  cirrusfs mount-mem /tmp/cirrusfs-mnt"
                    );
                    std::process::exit(2);
                }
            };
            mount_memory_drive(&mount_point).await;
        }
        _ => {
            println!(
                "Usage:\n  cirrusfs demo\n  cirrusfs mount-mem <mount_point>"
            );
        }
    }
}

async fn mount_memory_drive(mount_point: &str) {
    let remote = MemoryRemote::new();
    let fs = match DriveFs::new(remote).await {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("remote root discovery failed: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(mount_point) {
        eprintln!("create mount point failed: {e}");
        std::process::exit(1);
    }

    info!("mounting cirrusfs at {mount_point} (in-memory drive)");
    println!("Mounting cirrusfs at {mount_point} (in-memory drive)...");
    println!("Press Ctrl+C to unmount and exit.");
    let handle = match mount_unprivileged(DriveFuse::new(fs), std::path::Path::new(mount_point)).await
    {
        Ok(h) => h,
        Err(e) => {
            eprintln!(
                "mount failed: {e}\n\nHint: ensure you are on Linux with FUSE (fusermount3) available."
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("signal error: {e}");
    }

    println!("Unmounting...");
    if let Err(e) = handle.unmount().await {
        eprintln!("unmount error: {e}");
    }
}
