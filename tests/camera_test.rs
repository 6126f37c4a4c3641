use std::f32::consts::TAU;

use bindless_hybrid::{
    camera::{CameraUniform, OrbitCamera, Projection, perspective_zo},
    config::Config,
    pipelines::light::LightUniform,
};
use cgmath::{Deg, InnerSpace, Rad, Vector3, Vector4};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn should_start_the_orbit_on_the_x_axis() {
    let camera = OrbitCamera::new(1.0);
    assert_eq!(camera.angle(), 0.0);
    assert_eq!(camera.position(), Vector3::new(10.0, 5.0, 0.0));
}

#[test]
fn should_keep_the_orbit_angle_wrapped() {
    let mut camera = OrbitCamera::new(100.0);
    for _ in 0..7 {
        camera.advance();
        assert!((0.0..=TAU).contains(&camera.angle()));
    }
    assert!(approx(camera.angle(), 7.0 - TAU));

    let mut slow = OrbitCamera::from_config(&Config::default());
    slow.advance();
    assert!(approx(slow.angle(), 0.005));
}

#[test]
fn should_map_the_depth_range_to_unit_interval() {
    let (near, far) = (0.1, 250.0);
    let matrix = perspective_zo(Rad::from(Deg(65.0)), 16.0 / 9.0, near, far);

    let depth = |z: f32| {
        let clip = matrix * Vector4::new(0.0, 0.0, z, 1.0);
        clip.z / clip.w
    };
    assert!(approx(depth(-near), 0.0));
    assert!(approx(depth(-far), 1.0));
    assert!(depth(-10.0) > 0.0 && depth(-10.0) < 1.0);
}

#[test]
fn should_update_the_camera_uniform() {
    let config = Config {
        metallic_bias: 0.25,
        ..Default::default()
    };
    let camera = OrbitCamera::from_config(&config);
    let projection = Projection::from_config(&config, 1280, 720);
    assert!(approx(projection.aspect(), 1280.0 / 720.0));

    let mut uniform = CameraUniform::new();
    uniform.update(&camera, &projection);
    assert_eq!(uniform.position, [10.0, 5.0, 0.0]);
    assert_eq!(uniform.metallic_bias, 0.25);
    // the view is a pure translation by the negated eye position
    assert_eq!(uniform.view[3], [-10.0, -5.0, 0.0, 1.0]);
}

#[test]
fn should_point_the_light_towards_its_source() {
    let light = LightUniform::from_config(&Config::default());
    let expected = -Vector3::new(0.0, -6.0, -6.0).normalize();
    let actual = Vector3::from(light.inv_direction);
    assert!(approx((actual - expected).magnitude(), 0.0));
    assert!(approx(actual.magnitude(), 1.0));
    assert_eq!(light.intensity, 5.0);
}
