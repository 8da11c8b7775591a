//! Viewer application state.
//!
//! [`AppState`] owns everything the event loop touches: configuration,
//! viewport, camera, the current mesh with its BVH, and the highlighted
//! triangles. There is no global state; a windowing backend creates one
//! `AppState` and routes every event through [`AppState::handle_event`].

use std::collections::HashSet;
use std::sync::Arc;

use meshpick_math::{Point2, Transform, Viewport};
use meshpick_mesh::Mesh;
use meshpick_raytrace::{check_intersection_with_mode, Bvh};

use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::input::{InputEvent, Key, MouseButton};

/// What an event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to redraw.
    Ignored,
    /// The window should close.
    Quit,
    /// A new mesh and BVH are in place.
    MeshReplaced,
    /// The camera moved.
    CameraMoved,
    /// The viewport changed size.
    Resized,
    /// All highlights were removed.
    HighlightsCleared,
    /// A triangle was picked. `new` is false when it was already highlighted.
    Picked {
        /// Triangle id.
        id: u32,
        /// Whether a highlight was added.
        new: bool,
    },
    /// A left drag found no triangle under the cursor.
    Missed,
}

#[derive(Debug, Clone, Copy, Default)]
struct MouseState {
    pressed: bool,
    left: bool,
}

/// State of one viewer window.
#[derive(Debug)]
pub struct AppState {
    config: ViewerConfig,
    viewport: Viewport,
    camera: Camera,
    bvh: Bvh,
    highlighted: HashSet<u32>,
    highlights: Vec<Mesh>,
    bounding_box: Option<Mesh>,
    mouse: MouseState,
}

impl AppState {
    /// Viewer over `mesh`. The mesh is fitted to the view first when the
    /// configuration asks for it.
    pub fn new(config: ViewerConfig, mesh: Mesh) -> Self {
        let viewport = Viewport::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        );
        let camera = Camera::from_config(&config.camera);
        let mut state = Self {
            config,
            viewport,
            camera,
            bvh: Bvh::build(Arc::new(Mesh::empty())),
            highlighted: HashSet::new(),
            highlights: Vec::new(),
            bounding_box: None,
            mouse: MouseState::default(),
        };
        state.replace_mesh(mesh);
        state
    }

    /// Route one input event.
    pub fn handle_event(&mut self, event: InputEvent) -> Outcome {
        match event {
            InputEvent::Quit => Outcome::Quit,
            InputEvent::MeshDropped(mesh) => {
                self.replace_mesh(mesh);
                Outcome::MeshReplaced
            }
            InputEvent::KeyDown(Key::Q) => {
                self.clear_highlights();
                Outcome::HighlightsCleared
            }
            InputEvent::KeyDown(key) => {
                if self.camera.handle_key(key) {
                    Outcome::CameraMoved
                } else {
                    Outcome::Ignored
                }
            }
            InputEvent::MouseButton { button, pressed } => {
                self.mouse = MouseState {
                    pressed,
                    left: button == MouseButton::Left,
                };
                Outcome::Ignored
            }
            InputEvent::MouseMotion { x, y, dx, dy } => {
                if !self.mouse.pressed {
                    return Outcome::Ignored;
                }
                if !self.mouse.left {
                    self.camera.rotate(dx, dy);
                    return Outcome::CameraMoved;
                }
                match self.pick(&Point2::new(x, y)) {
                    Some(id) => Outcome::Picked {
                        id,
                        new: self.highlight(id),
                    },
                    None => Outcome::Missed,
                }
            }
            InputEvent::Resized { width, height } => {
                self.viewport = Viewport::new(f64::from(width), f64::from(height));
                Outcome::Resized
            }
        }
    }

    /// Swap in a new mesh. The BVH is rebuilt before anything is replaced,
    /// and highlights of the old mesh are dropped.
    pub fn replace_mesh(&mut self, mut mesh: Mesh) {
        if self.config.picking.fit_to_view {
            mesh.fit_to_view();
        }
        let bvh = Bvh::build(Arc::new(mesh));
        let bounding_box = bvh.mesh().bounding_box_mesh();
        log::info!(
            "mesh loaded: {} vertices, {} triangles",
            bvh.mesh().num_vertices(),
            bvh.mesh().num_triangles()
        );

        self.bvh = bvh;
        self.bounding_box = bounding_box;
        self.clear_highlights();
    }

    /// Triangle under the cursor, in window pixels from the top-left.
    pub fn pick(&self, mouse: &Point2) -> Option<u32> {
        let hit = check_intersection_with_mode(
            mouse,
            &self.viewport,
            &self.bvh,
            self.camera.view_matrix(),
            &self.projection(),
            self.config.picking.mode,
        );
        log::debug!("pick at ({:.1}, {:.1}): {:?}", mouse.x, mouse.y, hit);
        hit
    }

    /// Add a highlight overlay for `id` unless it already has one.
    fn highlight(&mut self, id: u32) -> bool {
        if !self.highlighted.insert(id) {
            return false;
        }
        match self
            .bvh
            .mesh()
            .highlight_triangle(id, self.config.picking.highlight_offset)
        {
            Some(overlay) => {
                self.highlights.push(overlay);
                true
            }
            None => {
                self.highlighted.remove(&id);
                false
            }
        }
    }

    /// Remove every highlight.
    pub fn clear_highlights(&mut self) {
        self.highlighted.clear();
        self.highlights.clear();
    }

    /// Perspective projection for the current viewport.
    pub fn projection(&self) -> Transform {
        let cam = &self.config.camera;
        Transform::perspective(cam.fovy, self.viewport.aspect(), cam.near, cam.far)
    }

    /// The mesh on display.
    pub fn mesh(&self) -> &Arc<Mesh> {
        self.bvh.mesh()
    }

    /// The picking hierarchy over [`AppState::mesh`].
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// The camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Highlight overlays in the order they were picked.
    pub fn highlights(&self) -> &[Mesh] {
        &self.highlights
    }

    /// Ids of highlighted triangles.
    pub fn highlighted(&self) -> &HashSet<u32> {
        &self.highlighted
    }

    /// Overlay of the mesh bounding box, if the mesh is not empty.
    pub fn bounding_box(&self) -> Option<&Mesh> {
        self.bounding_box.as_ref()
    }
}
