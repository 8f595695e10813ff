use std::{cell::RefCell, rc::Rc};

use quark::{Context, Logic, assets::BundleStage};
use quark_test_utils::{ASSET_X, BUNDLE_A, sample_fetcher};
use rstest::rstest;

use crate::common::{Slot, World, options};

/// Loads a texture on startup, counts frames once it arrived, releases it on shutdown.
struct Hud {
    texture: Slot<String>,
    ready_frames: Rc<RefCell<u32>>,
}

impl Logic for Hud {
    fn startup(&mut self, ctx: &Context) {
        let sink = Rc::clone(&self.texture);
        ctx.assets()
            .load_asset_async::<String, _>(ASSET_X, move |value| *sink.borrow_mut() = Some(value));
    }

    fn tick(&mut self, _ctx: &Context, _dt: f32) {
        if self.texture.borrow().as_ref().is_some_and(Option::is_some) {
            *self.ready_frames.borrow_mut() += 1;
        }
    }

    fn shutdown(&mut self, ctx: &Context) {
        if self.texture.borrow_mut().take().flatten().is_some() {
            ctx.assets().unload_asset(ASSET_X);
        }
    }
}

#[rstest]
fn logic_module_owns_its_asset_references() {
    let mut world = World::booted(options(), sample_fetcher());
    let ready_frames = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&ready_frames);
    world
        .runtime
        .registry_mut()
        .register("hud", move || Hud {
            texture: Rc::default(),
            ready_frames: Rc::clone(&counter),
        })
        .unwrap();

    world.runtime.add_logic("hud").unwrap();
    world.settle();

    assert!(*ready_frames.borrow() > 0);
    assert_eq!(world.runtime.assets().asset_ref_count(ASSET_X), 1);

    assert!(world.runtime.remove_logic("hud"));
    assert_eq!(world.runtime.assets().asset_ref_count(ASSET_X), 0);
    assert_eq!(
        world.runtime.assets().bundle_stage(BUNDLE_A),
        Some(BundleStage::Retained)
    );

    world.advance(5.0);
    assert_eq!(world.unloaded(), vec![BUNDLE_A.to_owned()]);
}
