use crate::{
    modules::{
        eviction::LastResidentEvictionModule,
        persistent_storage::{test::get_test_storage, FilePersistentStorageModule},
    },
    MemoryConfig, MemoryManager, MemorySnapshot,
};

mod swap;

pub(crate) type TestManager = MemoryManager<FilePersistentStorageModule, LastResidentEvictionModule>;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two primary frames, ten secondary frames, frames and pages of 50 units
pub(crate) fn small_config() -> MemoryConfig {
    MemoryConfig {
        primary_frame_count: 2,
        secondary_frame_count: 10,
        frame_size: 50,
        page_size: 50,
        ..Default::default()
    }
}

pub(crate) fn get_test_manager(test_name: &str, config: MemoryConfig) -> TestManager {
    init_logger();

    let storage = get_test_storage(test_name, &config);
    MemoryManager::new(storage, config).unwrap()
}

/// Every load checks the stored state, so this panics if it is inconsistent
pub(crate) fn assert_consistent(manager: &TestManager) -> MemorySnapshot {
    manager
        .snapshot()
        .expect("stored state should be loadable and consistent")
}
