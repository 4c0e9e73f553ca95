//! The viewer session: camera, selection and per-frame state.
//!
//! A [`Session`] owns every piece of state the live pass needs. Window
//! events are translated into [`InputEvent`]s; the camera only reacts to
//! them while capture is enabled.

use std::collections::HashSet;
use std::sync::Arc;

use prism_core::camera::{CameraMovement, FlyCamera};
use prism_core::math::{Mat4, Vec3, mat4_from_translation_scale};
use prism_graphics::{
    BakeBackend, Extent2d, FrameUniforms, GpuMesh, IblAssets, LightingToggles, MaterialTextures,
    MeshCache, MeshKind, ShadingBindings,
};

use crate::assets::DEFAULT_MATERIAL;
use crate::error::AppError;

/// Initial window size.
pub const DEFAULT_VIEWPORT: Extent2d = Extent2d::new(1280, 720);
/// Background clear color.
pub const DEFAULT_CLEAR_COLOR: [f32; 3] = [0.5, 0.7, 0.7];
/// Allowed model scale.
pub const SCALE_RANGE: (f32, f32) = (0.1, 2.0);
/// Allowed model translation per axis.
pub const TRANSLATION_RANGE: (f32, f32) = (-1.0, 1.0);

/// Input the session understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Grab or release the cursor for camera control.
    ToggleCapture,
    CursorMoved { x: f32, y: f32 },
    Scroll { dy: f32 },
    KeyPressed(CameraMovement),
    KeyReleased(CameraMovement),
}

#[derive(Debug, Clone, Copy, Default)]
struct Capture {
    enabled: bool,
    last_cursor: Option<(f32, f32)>,
}

/// What the live pass needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub uniforms: FrameUniforms,
    pub mesh: MeshKind,
    pub draw_background: bool,
    pub clear_color: [f32; 3],
}

#[derive(Debug)]
pub struct Session {
    camera: FlyCamera,
    meshes: MeshCache,
    shading: ShadingBindings,
    materials: Vec<MaterialTextures>,
    selected_material: usize,
    selected_mesh: MeshKind,
    scale: f32,
    translation: Vec3,
    clear_color: [f32; 3],
    lighting: LightingToggles,
    draw_background: bool,
    capture: Capture,
    held: HashSet<CameraMovement>,
    viewport: Extent2d,
    frame: u64,
    elapsed: f32,
}

impl Session {
    /// Start a session on the baked `assets`.
    ///
    /// `material` picks the initial material by name. Without one the
    /// session starts on [`DEFAULT_MATERIAL`] if present, else the first.
    pub fn new(
        assets: IblAssets,
        materials: Vec<MaterialTextures>,
        meshes: MeshCache,
        material: Option<&str>,
    ) -> Result<Self, AppError> {
        let selected_material = match material {
            Some(name) => find_material(&materials, name)?,
            None => materials
                .iter()
                .position(|m| m.name == DEFAULT_MATERIAL)
                .unwrap_or(0),
        };
        let Some(initial) = materials.get(selected_material) else {
            return Err(AppError::Config("no materials loaded".to_string()));
        };
        let shading = ShadingBindings::new(assets, initial.clone())?;
        log::info!("Session started with material `{}`", initial.name);

        Ok(Self {
            camera: FlyCamera::default(),
            meshes,
            shading,
            materials,
            selected_material,
            selected_mesh: MeshKind::Sphere,
            scale: 1.0,
            translation: Vec3::zeros(),
            clear_color: DEFAULT_CLEAR_COLOR,
            lighting: LightingToggles::default(),
            draw_background: true,
            capture: Capture::default(),
            held: HashSet::new(),
            viewport: DEFAULT_VIEWPORT,
            frame: 0,
            elapsed: 0.0,
        })
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::ToggleCapture => {
                self.capture.enabled = !self.capture.enabled;
                self.capture.last_cursor = None;
                log::debug!(
                    "Camera capture {}",
                    if self.capture.enabled { "on" } else { "off" }
                );
            }
            InputEvent::KeyPressed(movement) => {
                self.held.insert(movement);
            }
            InputEvent::KeyReleased(movement) => {
                self.held.remove(&movement);
            }
            InputEvent::CursorMoved { .. } | InputEvent::Scroll { .. }
                if !self.capture.enabled => {}
            InputEvent::CursorMoved { x, y } => {
                let Some((last_x, last_y)) = self.capture.last_cursor.replace((x, y)) else {
                    return;
                };
                // Screen y grows downwards.
                self.camera.look(x - last_x, last_y - y);
            }
            InputEvent::Scroll { dy } => self.camera.process_zoom(dy),
        }
    }

    /// Advance the frame clock, moving the camera along every held key.
    pub fn advance(&mut self, dt: f32) {
        if self.capture.enabled {
            for movement in &self.held {
                self.camera.process_movement(*movement, dt);
            }
        }
        self.frame += 1;
        self.elapsed += dt;
    }

    pub fn model_matrix(&self) -> Mat4 {
        mat4_from_translation_scale(self.translation, self.scale)
    }

    pub fn frame(&self) -> FrameState {
        let aspect = self.viewport.width as f32 / self.viewport.height as f32;
        FrameState {
            uniforms: FrameUniforms::from_camera(
                &self.camera,
                &self.model_matrix(),
                aspect,
                &self.lighting,
            ),
            mesh: self.selected_mesh,
            draw_background: self.draw_background,
            clear_color: self.clear_color,
        }
    }

    /// The selected mesh, uploaded through `backend` on first use.
    pub fn mesh<B: BakeBackend + ?Sized>(&self, backend: &mut B) -> Result<Arc<GpuMesh>, AppError> {
        Ok(self.meshes.get(self.selected_mesh, backend)?)
    }

    pub fn select_material(&mut self, name: &str) -> Result<(), AppError> {
        let index = find_material(&self.materials, name)?;
        self.shading = self.shading.clone().with_material(self.materials[index].clone())?;
        self.selected_material = index;
        log::info!("Selected material `{name}`");
        Ok(())
    }

    pub fn select_mesh(&mut self, kind: MeshKind) {
        self.selected_mesh = kind;
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(SCALE_RANGE.0, SCALE_RANGE.1);
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation.map(|v| v.clamp(TRANSLATION_RANGE.0, TRANSLATION_RANGE.1));
    }

    pub fn set_lighting(&mut self, lighting: LightingToggles) {
        self.lighting = lighting;
    }

    pub fn set_draw_background(&mut self, draw: bool) {
        self.draw_background = draw;
    }

    pub fn set_clear_color(&mut self, color: [f32; 3]) {
        self.clear_color = color;
    }

    pub fn resize(&mut self, viewport: Extent2d) {
        // Minimised windows report zero; keep the last usable aspect.
        if viewport.width > 0 && viewport.height > 0 {
            self.viewport = viewport;
        }
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn shading(&self) -> &ShadingBindings {
        &self.shading
    }

    pub fn meshes(&self) -> &MeshCache {
        &self.meshes
    }

    pub fn material(&self) -> &MaterialTextures {
        &self.materials[self.selected_material]
    }

    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    pub fn selected_mesh(&self) -> MeshKind {
        self.selected_mesh
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture.enabled
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Seconds simulated so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

fn find_material(materials: &[MaterialTextures], name: &str) -> Result<usize, AppError> {
    materials.iter().position(|m| m.name == name).ok_or_else(|| {
        let known: Vec<&str> = materials.iter().map(|m| m.name.as_str()).collect();
        AppError::Config(format!(
            "unknown material `{name}` (available: {})",
            known.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_graphics::{
        DummyBackend, RenderTargetManager, TextureDescriptor, TextureFormat, TextureUsage,
    };

    struct Fixture {
        target: RenderTargetManager<DummyBackend>,
        session: Session,
    }

    fn material(target: &mut RenderTargetManager<DummyBackend>, name: &str) -> MaterialTextures {
        let mut map = || {
            target
                .create_texture(TextureDescriptor::new_2d(
                    1,
                    1,
                    TextureFormat::Rgba8Unorm,
                    TextureUsage::sampled_upload(),
                ))
                .unwrap()
        };
        MaterialTextures {
            name: name.to_string(),
            normal: map(),
            albedo: map(),
            metallic: map(),
            roughness: map(),
            ao: map(),
        }
    }

    fn fixture(names: &[&str], selected: Option<&str>) -> Result<Fixture, AppError> {
        let mut target = RenderTargetManager::new(DummyBackend::new());
        let mut cube = || {
            target
                .create_texture(TextureDescriptor::new_cube(
                    4,
                    TextureFormat::Rgba16Float,
                    TextureUsage::bake_target(),
                ))
                .unwrap()
        };
        let (radiance, irradiance, prefilter) = (cube(), cube(), cube());
        let brdf_lut = target
            .create_texture(TextureDescriptor::new_2d(
                4,
                4,
                TextureFormat::Rg16Float,
                TextureUsage::bake_target(),
            ))
            .unwrap();
        let assets = IblAssets {
            radiance,
            irradiance,
            prefilter,
            brdf_lut,
        };
        let materials = names.iter().map(|n| material(&mut target, n)).collect();
        let session = Session::new(assets, materials, MeshCache::new(), selected)?;
        Ok(Fixture { target, session })
    }

    #[test]
    fn starts_on_rusted_iron_when_present() {
        let session = fixture(&["gold", "rusted_iron"], None).unwrap().session;
        assert_eq!(session.material().name, "rusted_iron");
        assert_eq!(session.selected_mesh(), MeshKind::Sphere);

        let session = fixture(&["gold", "wall"], None).unwrap().session;
        assert_eq!(session.material().name, "gold");
    }

    #[test]
    fn unknown_or_missing_materials_are_errors() {
        assert!(matches!(
            fixture(&["gold"], Some("plastic")),
            Err(AppError::Config(_))
        ));
        assert!(fixture(&[], None).is_err());
    }

    #[test]
    fn camera_ignores_input_until_capture_is_enabled() {
        let mut session = fixture(&["gold"], None).unwrap().session;
        let start = *session.camera();

        session.handle_event(InputEvent::CursorMoved { x: 10.0, y: 10.0 });
        session.handle_event(InputEvent::CursorMoved { x: 50.0, y: 0.0 });
        session.handle_event(InputEvent::Scroll { dy: 5.0 });
        session.handle_event(InputEvent::KeyPressed(CameraMovement::Forward));
        session.advance(1.0);
        assert_eq!(*session.camera(), start);

        session.handle_event(InputEvent::ToggleCapture);
        assert!(session.capture_enabled());
        session.advance(1.0);
        assert!(session.camera().position().z < start.position().z);
    }

    #[test]
    fn first_cursor_after_capture_only_seeds_the_position() {
        let mut session = fixture(&["gold"], None).unwrap().session;
        session.handle_event(InputEvent::ToggleCapture);
        session.handle_event(InputEvent::CursorMoved { x: 100.0, y: 100.0 });
        assert_eq!(session.camera().yaw(), -90.0);

        // Moving the cursor up raises the pitch.
        session.handle_event(InputEvent::CursorMoved { x: 110.0, y: 90.0 });
        assert!(session.camera().yaw() > -90.0);
        assert!(session.camera().pitch() > 0.0);

        // Re-capturing forgets the last cursor.
        session.handle_event(InputEvent::ToggleCapture);
        session.handle_event(InputEvent::ToggleCapture);
        let yaw = session.camera().yaw();
        session.handle_event(InputEvent::CursorMoved { x: 500.0, y: 500.0 });
        assert_eq!(session.camera().yaw(), yaw);
    }

    #[test]
    fn scroll_zooms_while_captured() {
        let mut session = fixture(&["gold"], None).unwrap().session;
        let fov = session.camera().fov();
        session.handle_event(InputEvent::ToggleCapture);
        session.handle_event(InputEvent::Scroll { dy: 5.0 });
        assert_eq!(session.camera().fov(), fov - 5.0);
    }

    #[test]
    fn released_keys_stop_moving() {
        let mut session = fixture(&["gold"], None).unwrap().session;
        session.handle_event(InputEvent::ToggleCapture);
        session.handle_event(InputEvent::KeyPressed(CameraMovement::Left));
        session.advance(0.5);
        let moved = session.camera().position();
        session.handle_event(InputEvent::KeyReleased(CameraMovement::Left));
        session.advance(0.5);
        assert_eq!(session.camera().position(), moved);
        assert_eq!(session.frame_count(), 2);
        assert_eq!(session.elapsed(), 1.0);
    }

    #[test]
    fn model_transform_is_clamped() {
        let mut session = fixture(&["gold"], None).unwrap().session;
        session.set_scale(5.0);
        session.set_translation(Vec3::new(3.0, -0.5, -4.0));

        let model = session.model_matrix();
        assert_eq!(model[(0, 0)], 2.0);
        assert_eq!(model[(0, 3)], 1.0);
        assert_eq!(model[(1, 3)], -0.5);
        assert_eq!(model[(2, 3)], -1.0);
    }

    #[test]
    fn frame_reflects_toggles_and_selection() {
        let mut session = fixture(&["gold", "wall"], None).unwrap().session;
        session.set_lighting(LightingToggles {
            punctual_light: false,
            image_based_light: true,
        });
        session.set_draw_background(false);
        session.select_mesh(MeshKind::Cube);
        session.select_material("wall").unwrap();

        let frame = session.frame();
        assert_eq!(frame.mesh, MeshKind::Cube);
        assert!(!frame.draw_background);
        assert_eq!(frame.clear_color, DEFAULT_CLEAR_COLOR);
        assert_eq!(frame.uniforms.punctual_light, 0);
        assert_eq!(frame.uniforms.image_based_light, 1);
        assert_eq!(session.shading().material().name, "wall");
        assert!(session.select_material("grass").is_err());
        assert_eq!(session.material().name, "wall");
    }

    #[test]
    fn selected_mesh_is_uploaded_once() {
        let Fixture {
            mut target,
            mut session,
        } = fixture(&["gold"], None).unwrap();
        let first = session.mesh(target.backend_mut()).unwrap();
        let again = session.mesh(target.backend_mut()).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        session.select_mesh(MeshKind::Quad);
        session.mesh(target.backend_mut()).unwrap();
        assert_eq!(session.meshes().len(), 2);
    }

    #[test]
    fn zero_sized_viewport_keeps_the_aspect() {
        let mut session = fixture(&["gold"], None).unwrap().session;
        let before = session.frame().uniforms.projection;
        session.resize(Extent2d::new(0, 0));
        assert_eq!(session.frame().uniforms.projection, before);
        session.resize(Extent2d::new(720, 720));
        assert_ne!(session.frame().uniforms.projection, before);
    }
}
