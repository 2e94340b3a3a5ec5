//! Manager-level scenarios on the headless backend


use crate::config::ManagerConfig;
use crate::manager::WindowManager;
use crate::platform::HeadlessPlatform;

fn manager() -> WindowManager<HeadlessPlatform> {
    WindowManager::new(HeadlessPlatform::new())
}

fn manager_with(config: ManagerConfig) -> WindowManager<HeadlessPlatform> {
    WindowManager::with_config(HeadlessPlatform::new(), config)
}
