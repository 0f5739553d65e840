// This test is ignored by default because it requires GPU & platform support.
// Run locally: `cargo test --test gpu_device -- --ignored --nocapture`
//
// Checks that the bundled sprite shaders pass wgpu validation on a real device.
#[test]
#[ignore]
fn bundled_shaders_validate_on_device() {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        // Request adapter w/out surface (headless check)
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no adapter found");

        let info = adapter.get_info();
        println!(
            "Test adapter: {} ({:?}) backend: {:?}",
            info.name, info.device_type, info.backend
        );

        let (device, _queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("spriteforge_test_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await?;

        let sources = spriteforge::SpriteConfig::default().shader_sources()?;
        for (label, source) in [("vertex", sources.vertex), ("fragment", sources.fragment)] {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let _module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            if let Some(err) = device.pop_error_scope().await {
                panic!("{label} shader failed validation: {err}");
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
    .unwrap();
}
