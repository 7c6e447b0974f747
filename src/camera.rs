use nalgebra::{Point3, Rotation3, Unit, Vector3};

use crate::handle_user_input::{Key, UserInputState};
use crate::render_system::bridge::{RendererBridge, Uniform, UniformValue};

#[inline]
fn deg2rad(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}

fn vec3(v: &Vector3<f32>) -> UniformValue {
    UniformValue::Vec3([v.x, v.y, v.z])
}

/// Where the camera is and what it looks at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_y_degrees: f32,
}

impl CameraPose {
    pub fn new(fov_y_degrees: f32) -> CameraPose {
        CameraPose {
            // slightly away from the origin, looking at it
            position: Point3::new(0.0, 0.0, 1.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov_y_degrees,
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(&self.up).normalize()
    }

    pub fn with_fov(self, fov_y_degrees: f32) -> CameraPose {
        CameraPose {
            fov_y_degrees,
            ..self
        }
    }

    // moves position and target together, orientation is unchanged
    pub fn translated(self, offset: Vector3<f32>) -> CameraPose {
        CameraPose {
            position: self.position + offset,
            target: self.target + offset,
            ..self
        }
    }

    /// Yaw about world up, then pitch about the camera's right axis as it was
    /// before the yaw. The up vector is left as is.
    pub fn rotated(self, yaw: f32, pitch: f32) -> CameraPose {
        let right = Unit::new_normalize(self.right());
        let yaw_rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), yaw);
        let pitch_rotation = Rotation3::from_axis_angle(&right, pitch);

        let direction = self.target - self.position;
        let direction = pitch_rotation * (yaw_rotation * direction);

        CameraPose {
            target: self.position + direction,
            ..self
        }
    }

    /// Applies one frame of held movement keys and pointer motion.
    pub fn moved(
        self,
        input: &UserInputState,
        dt: f32,
        move_speed: f32,
        rotation_speed: f32,
    ) -> CameraPose {
        let forward = self.forward();
        let right = self.right();
        let step = move_speed * dt;

        let mut offset = Vector3::zeros();
        if input.held(Key::W) {
            offset += forward * step;
        }
        if input.held(Key::S) {
            offset -= forward * step;
        }
        if input.held(Key::A) {
            offset -= right * step;
        }
        if input.held(Key::D) {
            offset += right * step;
        }
        if input.held(Key::E) {
            offset.y += step;
        }
        if input.held(Key::Q) {
            offset.y -= step;
        }

        let mut pose = self.translated(offset);

        let delta = input.pointer_delta;
        if delta.x != 0.0 || delta.y != 0.0 {
            let yaw = -delta.x * rotation_speed * dt;
            let pitch = -delta.y * rotation_speed * dt;
            pose = pose.rotated(yaw, pitch);
        }
        pose
    }

    /// Pinhole ray basis with the focal plane one unit in front of the eye.
    pub fn ray_basis(&self, aspect_ratio: f32, extent: [u32; 2]) -> RayBasis {
        // backward, right and up axes of the camera
        let w = (self.position - self.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        let u = self
            .up
            .cross(&w)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x);
        let v = w.cross(&u);

        let theta = deg2rad(self.fov_y_degrees);
        let viewport_height = 2.0 * (theta / 2.0).tan();
        let viewport_width = viewport_height * aspect_ratio;

        let viewport_u = u * viewport_width;
        let viewport_v = v * viewport_height;
        let viewport_upper_left = self.position - w - viewport_u / 2.0 - viewport_v / 2.0;

        RayBasis {
            w,
            u,
            v,
            viewport_width,
            viewport_height,
            viewport_u,
            viewport_v,
            viewport_upper_left,
            pixel_delta_u: viewport_u / extent[0] as f32,
            pixel_delta_v: viewport_v / extent[1] as f32,
            pixel00: viewport_upper_left,
        }
    }
}

/// Everything the shader needs to generate a primary ray per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayBasis {
    pub w: Vector3<f32>,
    pub u: Vector3<f32>,
    pub v: Vector3<f32>,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub viewport_u: Vector3<f32>,
    pub viewport_v: Vector3<f32>,
    pub viewport_upper_left: Point3<f32>,
    pub pixel_delta_u: Vector3<f32>,
    pub pixel_delta_v: Vector3<f32>,
    pub pixel00: Point3<f32>,
}

pub struct Camera {
    pose: CameraPose,
    // fixed when the camera is created, resizes do not change it
    aspect_ratio: f32,
    basis: RayBasis,
    pub move_speed: f32,
    pub rotation_speed: f32,
}

impl Camera {
    pub fn new(extent: [u32; 2], fov_y_degrees: f32) -> Camera {
        let pose = CameraPose::new(fov_y_degrees);
        let aspect_ratio = extent[0] as f32 / extent[1] as f32;
        Camera {
            pose,
            aspect_ratio,
            basis: pose.ray_basis(aspect_ratio, extent),
            move_speed: 5.0,
            rotation_speed: 0.1,
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    // the basis is stale until the next `update`
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn basis(&self) -> &RayBasis {
        &self.basis
    }

    /// Recomputes the ray basis. Call once per frame, before `publish`.
    pub fn update(&mut self, extent: [u32; 2]) {
        self.basis = self.pose.ray_basis(self.aspect_ratio, extent);
    }

    pub fn handle_input(&mut self, input: &UserInputState, dt: f32) {
        self.pose = self
            .pose
            .moved(input, dt, self.move_speed, self.rotation_speed);
    }

    pub fn publish(&self, bridge: &mut dyn RendererBridge) {
        bridge.set_uniform(Uniform::Pixel00, vec3(&self.basis.pixel00.coords));
        bridge.set_uniform(Uniform::PixelU, vec3(&self.basis.pixel_delta_u));
        bridge.set_uniform(Uniform::PixelV, vec3(&self.basis.pixel_delta_v));
        bridge.set_uniform(Uniform::CameraCenter, vec3(&self.pose.position.coords));
    }
}
