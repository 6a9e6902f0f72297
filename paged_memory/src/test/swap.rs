use super::{assert_consistent, get_test_manager, init_logger, small_config};
use crate::{
    modules::{
        eviction::SegmentLocalEvictionModule,
        persistent_storage::{test::get_test_storage, FilePersistentStorageModule},
    },
    MemoryConfig, MemoryError, MemoryManager, PageAddress, SwapOutcome, Tier,
};

fn two_page_lines() -> String {
    let line = "p".repeat(60);
    format!("{line}\n{line}\n{line}\n")
}

#[test]
fn test_swap_in_evicts_resident_page() {
    let manager = get_test_manager("test_swap_in_evicts_resident_page", small_config());
    manager.allocate(7, "first\nsecond\nthird\n").unwrap();
    let used_before = manager.used_by(7).unwrap();

    let outcome = manager.swap_in(3, 1, 7).unwrap();
    assert_eq!(
        outcome,
        SwapOutcome::Swapped {
            frame_ram: 1,
            evicted: Some(PageAddress::new(2, 1)),
        }
    );
    assert_eq!(manager.used_by(7).unwrap(), used_before);

    let process = manager.process(7).unwrap();
    let swapped_in = process.page(PageAddress::new(3, 1)).unwrap();
    assert!(swapped_in.presence_bit);
    assert_eq!(swapped_in.frame_ram, Some(1));

    let evicted = process.page(PageAddress::new(2, 1)).unwrap();
    assert!(!evicted.presence_bit);
    assert_eq!(evicted.frame_ram, None);

    // untouched
    assert!(process.page(PageAddress::new(1, 1)).unwrap().presence_bit);

    let frame = manager.frame(Tier::Primary, 1).unwrap();
    assert_eq!(frame.process_id, Some(7));
    assert_eq!(frame.segment_id, 3);
    assert_eq!(frame.page_number, 1);
    assert_eq!(frame.content, "third\n");

    // the evicted page is still available in the secondary tier
    assert_eq!(manager.read_page(2, 1, 7).unwrap(), "second\n");

    assert_consistent(&manager);
}

#[test]
fn test_swap_in_prefers_lower_free_frame() {
    let config = MemoryConfig {
        primary_frame_count: 4,
        ..small_config()
    };
    let manager = get_test_manager("test_swap_in_prefers_lower_free_frame", config);

    manager.allocate(2, "x").unwrap();
    manager.allocate(1, &two_page_lines()).unwrap();
    manager.release(2).unwrap();
    assert_eq!(manager.status().unwrap().primary_occupied, 3);

    let outcome = manager.swap_in(1, 2, 1).unwrap();
    assert_eq!(
        outcome,
        SwapOutcome::Swapped {
            frame_ram: 0,
            evicted: Some(PageAddress::new(3, 1)),
        }
    );

    // one frame was claimed, one was freed
    assert_eq!(manager.status().unwrap().primary_occupied, 3);
    assert!(manager.frame(Tier::Primary, 3).unwrap().is_free);
    assert_eq!(manager.read_page(1, 2, 1).unwrap(), "p".repeat(10) + "\n");

    assert_consistent(&manager);
}

#[test]
fn test_swap_in_resident_page_changes_nothing() {
    let manager = get_test_manager("test_swap_in_resident_page_changes_nothing", small_config());
    manager.allocate(7, "first\nsecond\nthird\n").unwrap();
    let before = manager.snapshot().unwrap();

    assert_eq!(
        manager.swap_in(1, 1, 7).unwrap(),
        SwapOutcome::AlreadyResident { frame_ram: 0 }
    );
    assert_eq!(manager.snapshot().unwrap(), before);
}

#[test]
fn test_swap_in_unknown_coordinates() {
    let manager = get_test_manager("test_swap_in_unknown_coordinates", small_config());
    manager.allocate(7, "first\nsecond\nthird\n").unwrap();
    let before = manager.snapshot().unwrap();

    assert!(matches!(
        manager.swap_in(1, 1, 8),
        Err(MemoryError::NotFound {
            process_id: 8,
            segment_id: None,
            page_number: None
        })
    ));
    assert!(matches!(
        manager.swap_in(4, 1, 7),
        Err(MemoryError::NotFound {
            segment_id: Some(4),
            ..
        })
    ));
    assert!(matches!(
        manager.swap_in(1, 2, 7),
        Err(MemoryError::NotFound {
            page_number: Some(2),
            ..
        })
    ));

    assert_eq!(manager.snapshot().unwrap(), before);
}

#[test]
fn test_swap_in_without_any_frame() {
    let manager = get_test_manager("test_swap_in_without_any_frame", small_config());
    manager.allocate(1, "a\nb\nc").unwrap();
    manager.allocate(2, "d\ne\nf").unwrap();
    let before = manager.snapshot().unwrap();

    // process 2 has nothing resident that could make room
    assert!(matches!(
        manager.swap_in(1, 1, 2),
        Err(MemoryError::CapacityExceeded {
            tier: Tier::Primary,
            ..
        })
    ));

    // no page of process 1 lost its frame
    assert_eq!(manager.snapshot().unwrap(), before);
    assert_eq!(manager.used_by(1).unwrap(), 2 * 50);
}

#[test]
fn test_swap_in_without_victim_uses_free_frame() {
    let manager = get_test_manager("test_swap_in_without_victim_uses_free_frame", small_config());
    manager.allocate(1, "a\nb\nc").unwrap();
    manager.allocate(2, "d\ne\nf").unwrap();
    manager.release(1).unwrap();

    let outcome = manager.swap_in(2, 1, 2).unwrap();
    assert_eq!(
        outcome,
        SwapOutcome::Swapped {
            frame_ram: 0,
            evicted: None,
        }
    );
    assert_eq!(manager.used_by(2).unwrap(), 50);
    assert_eq!(manager.read_page(2, 1, 2).unwrap(), "e\n");

    assert_consistent(&manager);
}

#[test]
fn test_segment_local_eviction() {
    init_logger();

    let config = MemoryConfig {
        primary_frame_count: 3,
        ..small_config()
    };
    let storage = get_test_storage("test_segment_local_eviction", &config);
    let manager: MemoryManager<FilePersistentStorageModule, SegmentLocalEvictionModule> =
        MemoryManager::new(storage, config).unwrap();

    manager.allocate(1, &two_page_lines()).unwrap();

    // the page of the same segment leaves, not the last resident one
    assert_eq!(
        manager.swap_in(2, 2, 1).unwrap(),
        SwapOutcome::Swapped {
            frame_ram: 1,
            evicted: Some(PageAddress::new(2, 1)),
        }
    );

    let process = manager.process(1).unwrap();
    let resident: Vec<PageAddress> = process
        .resident_pages()
        .map(|(address, _)| address)
        .collect();
    assert_eq!(
        resident,
        vec![
            PageAddress::new(1, 1),
            PageAddress::new(2, 2),
            PageAddress::new(3, 1)
        ]
    );
}

#[test]
fn test_repeated_swaps_keep_occupancy() {
    let manager = get_test_manager("test_repeated_swaps_keep_occupancy", small_config());
    manager.allocate(1, &two_page_lines()).unwrap();
    let occupied = manager.status().unwrap().primary_occupied;
    assert_eq!(occupied, 2);

    let addresses = [(3, 1), (3, 2), (1, 2), (2, 2), (1, 1), (2, 1)];
    for _ in 0..3 {
        for (segment_id, page_number) in addresses {
            manager.swap_in(segment_id, page_number, 1).unwrap();

            let page = manager
                .process(1)
                .unwrap()
                .page(PageAddress::new(segment_id, page_number))
                .cloned()
                .unwrap();
            assert!(page.presence_bit);
            assert_eq!(manager.status().unwrap().primary_occupied, occupied);
            assert_consistent(&manager);
        }
    }
}
