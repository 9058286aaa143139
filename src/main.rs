//! Magic Wishing Tree entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, HtmlCanvasElement, HtmlInputElement, HtmlVideoElement, MouseEvent, TouchEvent,
        WheelEvent,
    };

    use wishing_tree::platform::{CameraFeed, now_ms};
    use wishing_tree::renderer::{OrbitCamera, SceneRenderState};
    use wishing_tree::sim::{AnimationPhase, SceneEvent};
    use wishing_tree::{Director, Error, QualityPreset, Settings, Tuning};

    /// App instance holding all state
    struct App {
        director: Director,
        render_state: Option<SceneRenderState>,
        camera: OrbitCamera,
        settings: Settings,
        camera_feed: Option<CameraFeed>,
        start_ms: f64,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        // Pointer drag anchor (CSS pixels)
        drag_from: Option<(f32, f32)>,
        // Overlay is only touched when the phase changes
        shown_phase: Option<AnimationPhase>,
        shown_fps: Option<bool>,
    }

    impl App {
        fn new(seed: u64, tuning: Tuning, settings: Settings, now: f64) -> Self {
            Self {
                director: Director::new(seed, tuning, settings.particle_density(), now),
                render_state: None,
                camera: OrbitCamera::default(),
                settings,
                camera_feed: None,
                start_ms: now,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                drag_from: None,
                shown_phase: None,
                shown_fps: None,
            }
        }

        /// Advance the show and the camera
        fn update(&mut self, now: f64, frame_time: f64) {
            for event in self.director.update(now) {
                match event {
                    SceneEvent::BurstStarted { .. } => log::info!("Burst on screen"),
                    SceneEvent::PunchlineShown { .. } => log::info!("Punchline on screen"),
                    _ => {}
                }
            }

            let dt = if self.last_time > 0.0 {
                ((frame_time - self.last_time) / 1000.0) as f32
            } else {
                wishing_tree::consts::SIM_DT
            };
            self.last_time = frame_time;

            let auto_rotate =
                self.settings.effective_auto_rotate() && self.director.auto_rotate_allowed();
            self.camera
                .update(dt.min(wishing_tree::consts::MAX_FRAME_DT), auto_rotate);

            // Track frame times for FPS
            self.frame_times[self.frame_index] = frame_time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = frame_time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (59_000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, now: f64) {
            let rotation_y = self.director.rotation_y();
            let grain = self.settings.quality.film_grain();
            let time = ((now - self.start_ms) / 1000.0) as f32;
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let particles = self.director.particles(now);
            match render_state.render(particles, &self.camera, rotation_y, time, grain) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Update overlay elements in DOM
        fn update_overlay(&mut self, document: &Document) {
            let phase = self.director.phase();
            if self.shown_phase != Some(phase) {
                set_visible(document, "wish-panel", phase == AnimationPhase::Idle);
                set_visible(document, "punchline", phase == AnimationPhase::Punchline);
                if let Some(el) = document.get_element_by_id("phase") {
                    el.set_text_content(Some(phase.as_str()));
                }
                self.shown_phase = Some(phase);
            }

            if let Some(el) = document.get_element_by_id("gesture-label") {
                let label = self.director.hand().map_or("NO HAND", |h| h.label());
                el.set_text_content(Some(label));
            }

            if self.shown_fps != Some(self.settings.show_fps) {
                set_visible(document, "hud-fps", self.settings.show_fps);
                self.shown_fps = Some(self.settings.show_fps);
            }
            if self.settings.show_fps {
                if let Some(el) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                    el.set_text_content(Some(&self.fps.to_string()));
                }
            }
        }

        /// Remount the scene; quality changes take effect here
        fn reset(&mut self) {
            let density = self.settings.particle_density();
            if (density - self.director.density()).abs() > f32::EPSILON {
                log::info!("Remounting at {} quality", self.settings.quality.as_str());
            }
            self.director.set_density(density);
            self.director.reset();
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn js_error(e: Error) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Magic Wishing Tree starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        set_visible(&document, "loading", false);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let tuning = Tuning::load();
        let now = now_ms();
        let seed = now as u64;
        let app = Rc::new(RefCell::new(App::new(seed, tuning, settings.clone(), now)));

        log::info!("Scene initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| js_error(e.into()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| js_error(e.into()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = SceneRenderState::new(surface, &adapter, width, height)
            .await
            .map_err(js_error)?;
        app.borrow_mut().render_state = Some(render_state);

        setup_wish_form(&document, app.clone());
        setup_reset_button(&document, app.clone());
        setup_camera_controls(&canvas, app.clone());
        setup_keyboard(app.clone());
        setup_resize(canvas.clone(), app.clone());
        setup_teardown(app.clone());

        if settings.gesture_radar {
            start_camera(&document, app.clone());
        } else {
            set_visible(&document, "radar", false);
        }

        request_animation_frame(app);

        log::info!("Magic Wishing Tree running!");
        Ok(())
    }

    /// Ask for the camera in the background; the show runs without it
    fn start_camera(document: &Document, app: Rc<RefCell<App>>) {
        let preview: Option<HtmlVideoElement> = document
            .get_element_by_id("radar-video")
            .and_then(|el| el.dyn_into().ok());
        wasm_bindgen_futures::spawn_local(async move {
            match CameraFeed::acquire(preview.as_ref()).await {
                Ok(feed) => app.borrow_mut().camera_feed = Some(feed),
                Err(e) => log::error!("Camera access failed: {}", e),
            }
        });
    }

    fn setup_wish_form(document: &Document, app: Rc<RefCell<App>>) {
        let Some(form) = document.get_element_by_id("wish-form") else {
            log::warn!("No wish form in page");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            let Some(input) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("wish-input"))
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };

            let text = input.value();
            match app.borrow_mut().director.submit_wish(&text, now_ms()) {
                Ok(_) => input.set_value(""),
                Err(Error::EmptyWish) => {}
                Err(e) => log::warn!("Wish ignored: {}", e),
            }
        });
        let _ = form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_reset_button(document: &Document, app: Rc<RefCell<App>>) {
        if let Some(btn) = document.get_element_by_id("reset-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().reset();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_camera_controls(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Mouse drag rotates
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                app.borrow_mut().drag_from = Some((event.client_x() as f32, event.client_y() as f32));
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                if let Some((x0, y0)) = a.drag_from {
                    let (x, y) = (event.client_x() as f32, event.client_y() as f32);
                    let h = canvas_clone.client_height() as f32;
                    a.camera.drag(x - x0, y - y0, h);
                    a.drag_from = Some((x, y));
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let window = web_sys::window();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().drag_from = None;
            });
            if let Some(window) = window {
                let _ = window
                    .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }

        // Wheel zooms
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: WheelEvent| {
                event.prevent_default();
                app.borrow_mut().camera.zoom(event.delta_y() as f32);
            });
            let _ = canvas.add_event_listener_with_callback("wheel", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch drag rotates
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    app.borrow_mut().drag_from =
                        Some((touch.client_x() as f32, touch.client_y() as f32));
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut a = app.borrow_mut();
                    let (x, y) = (touch.client_x() as f32, touch.client_y() as f32);
                    if let Some((x0, y0)) = a.drag_from {
                        let h = canvas_clone.client_height() as f32;
                        a.camera.drag(x - x0, y - y0, h);
                    }
                    a.drag_from = Some((x, y));
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                app.borrow_mut().drag_from = None;
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            // Typing a wish must not trigger shortcuts
            let typing = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                .is_some();
            if typing {
                return;
            }

            let mut a = app.borrow_mut();
            match event.key().as_str() {
                "f" | "F" => a.settings.show_fps = !a.settings.show_fps,
                "m" | "M" => {
                    a.settings.reduced_motion = !a.settings.reduced_motion;
                    log::info!("Reduced motion: {}", a.settings.reduced_motion);
                }
                "q" | "Q" => {
                    a.settings.quality = match a.settings.quality {
                        QualityPreset::Low => QualityPreset::Medium,
                        QualityPreset::Medium => QualityPreset::High,
                        QualityPreset::High => QualityPreset::Low,
                    };
                    log::info!("Quality: {} (applies on reset)", a.settings.quality.as_str());
                }
                _ => return,
            }
            a.settings.save();
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(canvas: HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let width = (canvas.client_width() as f64 * dpr) as u32;
            let height = (canvas.client_height() as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(render_state) = app.borrow_mut().render_state.as_mut() {
                render_state.resize(width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Stop the camera when the page goes away
    fn setup_teardown(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if let Some(feed) = app.borrow_mut().camera_feed.take() {
                feed.release();
            }
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let now = now_ms();
            let mut a = app.borrow_mut();
            a.update(now, time);
            a.render(now);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                a.update_overlay(&document);
            }
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    let result = wasm_app::run().await;
    if let Err(e) = &result {
        log::error!("Startup failed: {:?}", e);
    }
    result
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Magic Wishing Tree (native) starting...");
    log::info!("Rendering needs a browser - run with `trunk serve` for the web version");

    let wish = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let wish = if wish.trim().is_empty() {
        "a snow globe that never runs out of snow".to_string()
    } else {
        wish
    };

    if let Err(e) = rehearse(&wish) {
        log::error!("Rehearsal failed: {}", e);
        std::process::exit(1);
    }
}

/// Run the whole show headless against a simulated 60 fps clock
#[cfg(not(target_arch = "wasm32"))]
fn rehearse(wish: &str) -> wishing_tree::Result<()> {
    use wishing_tree::sim::{Layer, SceneEvent};
    use wishing_tree::{Director, Settings, Tuning};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    let settings = Settings::load();
    let tuning = Tuning::load();
    let start = wishing_tree::platform::now_ms();
    let mut director = Director::new(start as u64, tuning, settings.particle_density(), 0.0);
    log::info!(
        "Tree mounted with {} particles",
        director.scene().tree.particle_count()
    );

    director.submit_wish(wish, 0.0)?;
    println!("[{:>7.1} ms] wish: {:?}", 0.0, wish);

    let mut now = 0.0;
    while !director.punchline_shown() {
        now += FRAME_MS;
        for event in director.update(now) {
            let label = match event {
                SceneEvent::BurstStarted { at_ms } => format!("burst (scheduled {at_ms:.1} ms)"),
                SceneEvent::WishConverged => "wish particles converged".to_string(),
                SceneEvent::PunchlineShown { at_ms } => {
                    format!("punchline (scheduled {at_ms:.1} ms)")
                }
                other => format!("{other:?}"),
            };
            println!("[{:>7.1} ms] {}", now, label);
        }
    }

    let particles = director.particles(now);
    for layer in Layer::ALL {
        println!("{:>10}: {}", format!("{layer:?}"), particles.layer(layer).len());
    }
    println!("Sorry, no gift... But Merry Christmas!");

    let event = director.reset();
    log::info!("{:?}", event);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
