use proptest::prelude::*;

use tomb_core::codec::{Pos3d, Vector3};
use tomb_core::cursor::SkipAccounting;
use tomb_core::gameflow::GameFlow;
use tomb_core::hooks::{CountedInventory, Inventory, LevelHooks, NoopHooks};
use tomb_core::item::{CreatureInfo, IF_ONESHOT, Item, ItemStatus};
use tomb_core::layout::SectionId;
use tomb_core::object::{Behaviour, ObjectId, ObjectInfo, ObjectTable, SaveFlags};
use tomb_core::player::{NO_BOX, PLAYER_RECORD_LEN, PointerTables};
use tomb_core::schema::{CREATURE_RECORD_LEN, FLAGS_BLOCK_LEN, POSITION_BLOCK_LEN};
use tomb_core::session::{GameSession, LevelState};
use tomb_core::start_info::{GUN_MAGNUMS, StartFlags};
use tomb_core::{SaveError, schema};

const WOLF: ObjectId = ObjectId(20);
const BLOCK: ObjectId = ObjectId(48);

fn objects() -> ObjectTable {
    let mut objects = ObjectTable::new();
    objects.set(ObjectId::PLAYER, ObjectInfo::new(SaveFlags::all()));
    objects.set(
        WOLF,
        ObjectInfo::new(SaveFlags::all()).intelligent().with_shadow(128),
    );
    objects.set(
        BLOCK,
        ObjectInfo::new(SaveFlags::POSITION | SaveFlags::ANIM | SaveFlags::FLAGS)
            .with_behaviour(Behaviour::MovableBlock),
    );
    objects.set(
        ObjectId::KEY_ITEM1,
        ObjectInfo::new(SaveFlags::FLAGS).with_behaviour(Behaviour::Pickup),
    );
    objects
}

/// Items as the level loader leaves them, before a save is applied.
fn fresh_items() -> Vec<Item> {
    vec![
        Item::new(ObjectId::PLAYER),
        Item::new(WOLF),
        Item::new(BLOCK),
        Item::new(ObjectId::KEY_ITEM1),
        Item::new(ObjectId(200)),
    ]
}

fn fresh_level() -> LevelState {
    LevelState {
        objects: objects(),
        items: fresh_items(),
        cameras: vec![0; 3],
        tables: PointerTables::new((0..20).map(|i| i * 128).collect(), vec![0, 48, 96], 44),
    }
}

fn played_session() -> GameSession {
    let mut session = GameSession::new(GameFlow::default()).with_level(fresh_level());
    session.current_level = 3;
    session.save_counter = 7;
    session.info.timer = 123_456;
    session.info.kills = 42;
    session.info.secrets = 0b101;
    session.info.pickups = 9;
    session.flip.status = 1;
    session.flip.table[0] = 0x3E00;
    session.flip.table[9] = i16::MIN;
    session.flip.effect = -1;
    session.flip.timer = 30;
    session.level.cameras = vec![0x0100, 0, -2];

    let items = &mut session.level.items;
    items[0].pos = Pos3d {
        x: 30_000,
        y: -512,
        z: 41_000,
        x_rot: 0,
        y_rot: 0x4000,
        z_rot: 0,
    };
    items[0].room_number = 5;
    items[0].hit_points = 1000;
    items[0].current_anim_state = 2;
    items[0].active = true;
    items[0].status = ItemStatus::Active;
    items[0].gravity_status = true;

    items[1].pos.x = 20_480;
    items[1].room_number = 6;
    items[1].hit_points = 6;
    items[1].flags = IF_ONESHOT;
    items[1].timer = -3;
    items[1].active = true;
    items[1].status = ItemStatus::Active;
    items[1].creature = Some(CreatureInfo {
        head_rotation: 100,
        neck_rotation: -100,
        maximum_turn: 546,
        flags: 2,
        mood: 1,
    });

    items[2].pos.z = 3584;
    items[2].status = ItemStatus::Active;
    items[2].current_anim_state = 1;

    items[3].status = ItemStatus::Invisible;
    items[3].collidable = false;

    let player = &mut session.player;
    player.item_number = 0;
    player.gun_type = GUN_MAGNUMS as i16;
    player.air = 1800;
    player.mesh_effects = 0x0004_0000;
    player.meshes = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
    player.left_arm.frame_base = 1;
    player.right_arm.frame_base = 2;
    player.right_arm.lock = 1;
    player.magnums.ammo = 48;
    player.lot.search_number = 77;
    player.lot.target_box = 12;
    player.lot.target = Vector3 {
        x: 1024,
        y: 0,
        z: -1024,
    };
    session
}

fn inventory() -> CountedInventory {
    CountedInventory::new()
        .with_item(ObjectId::PISTOL_ITEM, 1)
        .with_item(ObjectId::MAGNUM_ITEM, 1)
        .with_item(ObjectId::MEDI_ITEM, 2)
        .with_item(ObjectId::KEY_ITEM1, 1)
        .with_item(ObjectId::PUZZLE_ITEM2, 3)
}

fn load_into_fresh(saved: &GameSession) -> (GameSession, CountedInventory) {
    let mut loaded = GameSession::new(GameFlow::default()).with_level(fresh_level());
    loaded.buffer_mut()[..saved.filled().len()].copy_from_slice(saved.filled());
    loaded.current_level = saved.current_level;
    let mut inventory = CountedInventory::new();
    loaded.apply_buffer(&mut inventory, &mut NoopHooks).unwrap();
    (loaded, inventory)
}

#[test]
fn apply_reproduces_filled_session() {
    let mut saved = played_session();
    saved.fill_buffer(&inventory()).unwrap();
    let (loaded, loaded_inventory) = load_into_fresh(&saved);

    assert_eq!(loaded.current_level, 3);
    assert_eq!(loaded.info, saved.info);
    assert_eq!(loaded.flip, saved.flip);
    assert_eq!(loaded.level.cameras, saved.level.cameras);
    assert_eq!(loaded.level.items, saved.level.items);

    let mut expected_player = saved.player.clone();
    expected_player.lot.target_box = NO_BOX;
    assert_eq!(loaded.player, expected_player);

    assert_eq!(loaded_inventory.request_item(ObjectId::KEY_ITEM1), 1);
    assert_eq!(loaded_inventory.request_item(ObjectId::PUZZLE_ITEM2), 3);
    assert_eq!(loaded_inventory.request_item(ObjectId::MEDI_ITEM), 2);
    assert_eq!(loaded_inventory.request_item(ObjectId::MAGNUM_ITEM), 1);
}

#[test]
fn fill_snapshots_current_loadout_and_aliases_it() {
    let mut session = played_session();
    session.fill_buffer(&inventory()).unwrap();

    let current = session.info.start[3];
    assert!(current.flags.contains(StartFlags::AVAILABLE | StartFlags::GOT_MAGNUMS));
    assert_eq!(current.magnum_ammo, 48);
    assert_eq!(current.num_medis, 2);

    let alias = session.flow.current_aliases().next().unwrap();
    assert_eq!(session.info.start[alias], current);
}

#[test]
fn runtime_references_follow_load_rules() {
    let mut saved = played_session();
    saved.player.spaz_effect = Some(2);
    saved.player.target = Some(1);
    saved.player.lot.node = Some(4);
    saved.fill_buffer(&inventory()).unwrap();

    let mut loaded = GameSession::new(GameFlow::default()).with_level(fresh_level());
    loaded.player.lot.node = Some(9);
    loaded.player.target = Some(3);
    loaded.buffer_mut()[..saved.filled().len()].copy_from_slice(saved.filled());
    loaded
        .apply_buffer(&mut CountedInventory::new(), &mut NoopHooks)
        .unwrap();

    assert_eq!(loaded.player.spaz_effect, None);
    assert_eq!(loaded.player.target, None);
    assert_eq!(loaded.player.lot.node, Some(9));
    assert_eq!(loaded.player.lot.target_box, NO_BOX);
}

#[test]
fn layout_tiles_the_written_bytes() {
    let mut session = played_session();
    let layout = session.fill_buffer(&inventory()).unwrap();
    layout.validate().unwrap();
    assert_eq!(layout.file_len, session.filled().len());

    let wolf = layout.section(SectionId::Item(1)).unwrap();
    assert_eq!(
        wolf.range.len(),
        POSITION_BLOCK_LEN + 10 + 2 + FLAGS_BLOCK_LEN + CREATURE_RECORD_LEN
    );
    assert!(layout.section(SectionId::Item(4)).unwrap().range.is_empty());
    assert_eq!(
        layout.section(SectionId::Player).unwrap().range.len(),
        PLAYER_RECORD_LEN
    );
    assert_eq!(layout.section(SectionId::Trailer).unwrap().range.len(), 8);
}

#[test]
fn toggling_one_capability_changes_only_its_span() {
    let mut base = played_session();
    let base_layout = base.fill_buffer(&inventory()).unwrap();

    let mut toggled = played_session();
    toggled.level.objects.set(
        BLOCK,
        ObjectInfo::new(
            SaveFlags::POSITION | SaveFlags::ANIM | SaveFlags::HITPOINTS | SaveFlags::FLAGS,
        )
        .with_behaviour(Behaviour::MovableBlock),
    );
    let toggled_layout = toggled.fill_buffer(&inventory()).unwrap();

    assert_eq!(toggled.filled().len(), base.filled().len() + 2);
    for (a, b) in base_layout.sections.iter().zip(&toggled_layout.sections) {
        assert_eq!(a.id, b.id);
        let grown = if a.id == SectionId::Item(2) { 2 } else { 0 };
        assert_eq!(b.range.len(), a.range.len() + grown, "{:?}", a.id);
    }

    let block = base_layout.section(SectionId::Item(2)).unwrap().range;
    assert_eq!(
        &base.filled()[..block.start],
        &toggled.filled()[..block.start]
    );
    assert_eq!(
        &base.filled()[block.end..],
        &toggled.filled()[block.end + 2..]
    );
}

struct NoCreaturePool;

impl LevelHooks for NoCreaturePool {
    fn enable_creature_ai(&mut self, _index: usize, _item: &mut Item) {}
}

#[test]
fn creature_record_is_skipped_when_no_ai_slot_is_free() {
    let mut saved = played_session();
    saved.fill_buffer(&inventory()).unwrap();

    let mut loaded = GameSession::new(GameFlow::default()).with_level(fresh_level());
    loaded.buffer_mut()[..saved.filled().len()].copy_from_slice(saved.filled());
    loaded
        .apply_buffer(&mut CountedInventory::new(), &mut NoCreaturePool)
        .unwrap();

    assert!(loaded.level.items[1].creature.is_none());
    // Everything after the wolf still lines up.
    assert_eq!(loaded.level.items[2], saved.level.items[2]);
    assert_eq!(loaded.player.meshes, saved.player.meshes);
    assert_eq!(loaded.flip.timer, saved.flip.timer);
}

#[test]
fn creature_state_is_dropped_when_bit_is_clear() {
    let mut saved = played_session();
    saved.level.items[1].creature = None;
    saved.fill_buffer(&inventory()).unwrap();

    let mut loaded = GameSession::new(GameFlow::default()).with_level(fresh_level());
    loaded.level.items[1].creature = Some(CreatureInfo::default());
    loaded.buffer_mut()[..saved.filled().len()].copy_from_slice(saved.filled());
    loaded
        .apply_buffer(&mut CountedInventory::new(), &mut NoopHooks)
        .unwrap();
    assert!(loaded.level.items[1].creature.is_none());
}

#[derive(Default)]
struct FlipCounter {
    flips: usize,
}

impl LevelHooks for FlipCounter {
    fn flip_map(&mut self) {
        self.flips += 1;
    }
}

fn flips_on_load(status: i32) -> (usize, i32) {
    let mut saved = played_session();
    saved.flip.status = status;
    saved.fill_buffer(&inventory()).unwrap();

    let mut loaded = GameSession::new(GameFlow::default()).with_level(fresh_level());
    loaded.buffer_mut()[..saved.filled().len()].copy_from_slice(saved.filled());
    let mut hooks = FlipCounter::default();
    loaded
        .apply_buffer(&mut CountedInventory::new(), &mut hooks)
        .unwrap();
    (hooks.flips, loaded.flip.status)
}

#[test]
fn flipped_map_is_flipped_again_on_load() {
    assert_eq!(flips_on_load(1), (1, 1));
    assert_eq!(flips_on_load(0), (0, 0));
}

#[test]
fn overflow_is_fatal_at_a_predictable_size() {
    let mut sizing = played_session();
    let needed = sizing.fill_buffer(&inventory()).unwrap().file_len;

    let mut flow = GameFlow::default();
    flow.save.buffer_capacity = needed;
    let mut exact = GameSession::new(flow.clone()).with_level(played_session().level);
    exact.player = sizing.player.clone();
    exact.current_level = 3;
    assert!(exact.fill_buffer(&inventory()).is_ok());

    flow.save.buffer_capacity = needed - 1;
    let mut short = GameSession::new(flow).with_level(played_session().level);
    short.player = sizing.player.clone();
    short.current_level = 3;
    let err = short.fill_buffer(&inventory()).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        SaveError::BufferOverflow { needed: n, capacity } if n == needed && capacity == needed - 1
    ));
    assert!(short.filled().is_empty());
}

#[test]
fn many_items_overflow_the_default_buffer() {
    let mut session = played_session();
    let wolf = session.level.items[1].clone();
    let per_wolf = schema::encoded_len(&wolf, session.level.objects.get(WOLF));
    session.level.items.extend(std::iter::repeat_n(wolf, 10 * 1024 / per_wolf));

    assert!(matches!(
        session.fill_buffer(&inventory()),
        Err(SaveError::BufferOverflow { capacity: 10240, .. })
    ));
}

#[test]
fn uncounted_skips_leave_decoding_unchanged() {
    let mut saved = played_session();
    saved.fill_buffer(&inventory()).unwrap();

    let mut flow = GameFlow::default();
    flow.save.skip_accounting = SkipAccounting::Uncounted;
    let mut loaded = GameSession::new(flow).with_level(fresh_level());
    loaded.buffer_mut()[..saved.filled().len()].copy_from_slice(saved.filled());
    loaded
        .apply_buffer(&mut CountedInventory::new(), &mut NoopHooks)
        .unwrap();

    assert_eq!(loaded.level.items, saved.level.items);
    assert_eq!(loaded.flip, saved.flip);
}

fn arb_creature() -> impl Strategy<Value = Option<CreatureInfo>> {
    proptest::option::of(
        (any::<i16>(), any::<i16>(), any::<i16>(), any::<i16>(), any::<i32>()).prop_map(
            |(head_rotation, neck_rotation, maximum_turn, flags, mood)| CreatureInfo {
                head_rotation,
                neck_rotation,
                maximum_turn,
                flags,
                mood,
            },
        ),
    )
}

fn arb_pos() -> impl Strategy<Value = Pos3d> {
    (
        -0x00FF_FFFFi32..0x00FF_FFFF,
        -0x00FF_FFFFi32..0x00FF_FFFF,
        -0x00FF_FFFFi32..0x00FF_FFFF,
        any::<i16>(),
        any::<i16>(),
        any::<i16>(),
    )
        .prop_map(|(x, y, z, x_rot, y_rot, z_rot)| Pos3d {
            x,
            y,
            z,
            x_rot,
            y_rot,
            z_rot,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Fields persisted for the wolf come back exactly as saved.
    #[test]
    fn wolf_fields_round_trip(
        pos in arb_pos(),
        room in any::<i16>(),
        anim in proptest::array::uniform5(any::<i16>()),
        hit_points in any::<i16>(),
        trigger in 0u8..0x80,
        timer in any::<i16>(),
        status in 0u16..4,
        active in any::<bool>(),
        creature in arb_creature(),
        timer_total in any::<u32>(),
        kills in any::<u32>(),
    ) {
        let mut saved = played_session();
        saved.info.timer = timer_total;
        saved.info.kills = kills;
        let wolf = &mut saved.level.items[1];
        wolf.pos = pos;
        wolf.room_number = room;
        [
            wolf.current_anim_state,
            wolf.goal_anim_state,
            wolf.required_anim_state,
            wolf.anim_number,
            wolf.frame_number,
        ] = anim;
        wolf.hit_points = hit_points.max(1);
        wolf.flags = (trigger as u16) << 8;
        wolf.timer = timer;
        wolf.status = ItemStatus::from_bits(status);
        wolf.active = active;
        wolf.creature = creature;
        saved.fill_buffer(&inventory()).unwrap();

        let (loaded, _) = load_into_fresh(&saved);
        prop_assert_eq!(&loaded.level.items[1], &saved.level.items[1]);
        prop_assert_eq!(loaded.info.timer, timer_total);
        prop_assert_eq!(loaded.info.kills, kills);
        prop_assert_eq!(&loaded.level.items[2..], &saved.level.items[2..]);
    }
}
