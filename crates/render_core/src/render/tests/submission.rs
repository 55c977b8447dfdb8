use super::{device, flat_material, triangle, FRAGMENT_SHADER, TRIANGLE, VERTEX_SHADER};
use crate::foundation::math::Vec4;
use crate::render::backend::BackendError;
use crate::render::builders::{FrameBufferBuilder, MaterialBuilder, TextureBuilder};
use crate::render::command::sort::sort_order;
use crate::render::command::{CommandKind, CommandList, DrawCommand};
use crate::render::error::RenderError;
use crate::render::handle::ResourceKind;
use crate::render::resources::{AttachmentPoint, FrameBufferAttachment, ParameterValue, TextureFormat};

#[test]
fn test_unsorted_submission_keeps_recorded_order() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");
    device.backend_mut().reset_calls();

    let mut list = CommandList::new();
    list.viewport().set_rectangle(0, 0, 320, 240);
    list.fill_vertex_buffer().set_buffer(vb).set_vertices(&TRIANGLE);
    list.clear().set_color(1.0, 0.0, 0.0, 1.0).set_clear_color(true);
    list.scissor().set_rectangle(10, 10, 100, 100);
    list.push(DrawCommand::new(vb, material, 3));
    list.push(DrawCommand::new(vb, material, 3));

    let report = device.submit(list, false).unwrap();

    assert_eq!(
        device.backend().dispatched(),
        vec![
            CommandKind::Viewport,
            CommandKind::FillVertexBuffer,
            CommandKind::Clear,
            CommandKind::Scissor,
            CommandKind::Draw,
            CommandKind::Draw,
        ]
    );
    assert_eq!(report.dispatched, 6);
    assert_eq!(report.draw_calls, 2);
    assert!(!report.sorted);
}

#[test]
fn test_clear_stays_before_draw_when_sorted() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");

    let mut list = CommandList::new();
    list.clear().set_color(1.0, 0.0, 0.0, 1.0).set_clear_color(true);
    list.draw().set_vertex_buffer(vb).set_material(material).set_vertex_count(3);

    device.submit(list, true).unwrap();

    assert_eq!(device.backend().dispatched(), vec![CommandKind::Clear, CommandKind::Draw]);
    assert_eq!(device.backend().clear_color(None), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
}

#[test]
fn test_upload_stays_before_consuming_draw() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");

    let mut list = CommandList::new();
    list.fill_vertex_buffer().set_buffer(vb).set_vertices(&TRIANGLE);
    list.draw().set_vertex_buffer(vb).set_material(material).set_vertex_count(3).set_sort_key(0);

    device.submit(list, true).unwrap();
    assert_eq!(device.backend().dispatched(), vec![CommandKind::FillVertexBuffer, CommandKind::Draw]);
}

#[test]
fn test_upload_not_hoisted_above_earlier_draw() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");

    let moved: Vec<f32> = TRIANGLE.iter().map(|v| v + 0.25).collect();
    let mut list = CommandList::new();
    list.push(DrawCommand::new(vb, material, 3));
    list.fill_vertex_buffer().set_buffer(vb).set_vertices(&moved[..]);
    list.push(DrawCommand::new(vb, material, 3));

    device.submit(list, true).unwrap();

    assert_eq!(
        device.backend().dispatched(),
        vec![CommandKind::Draw, CommandKind::FillVertexBuffer, CommandKind::Draw]
    );
    assert_eq!(device.backend().vertex_buffer_data(vb), Some(bytemuck::cast_slice::<f32, u8>(&moved[..])));
}

#[test]
fn test_sorted_draws_grouped_by_program() {
    let mut device = device();
    let vb = triangle(&mut device);
    let plain = flat_material(&mut device, "plain");
    let fogged = MaterialBuilder::new("fogged")
        .vertex_shader(VERTEX_SHADER)
        .fragment_shader(FRAGMENT_SHADER)
        .define("USE_FOG", "1")
        .build(&mut device)
        .unwrap();

    let mut list = CommandList::new();
    list.push(DrawCommand::new(vb, plain, 3));
    list.push(DrawCommand::new(vb, fogged, 3));
    list.push(DrawCommand::new(vb, plain, 3));

    assert_eq!(sort_order(list.commands(), &device), vec![0, 2, 1]);

    let report = device.submit(list, true).unwrap();
    assert!(report.sorted);
    assert_eq!(report.draw_calls, 3);
}

#[test]
fn test_empty_submission_reaches_no_backend() {
    let mut device = device();
    device.backend_mut().reset_calls();

    let report = device.submit(CommandList::new(), true).unwrap();

    assert_eq!(report.dispatched, 0);
    assert!(device.backend().calls().is_empty());
}

#[test]
fn test_destroyed_buffer_in_command_is_stale() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");
    device.destroy(vb).unwrap();

    // A new buffer may reuse the freed slot; the old handle must not reach it
    let replacement = triangle(&mut device);
    assert_ne!(vb, replacement);
    device.backend_mut().reset_calls();

    let mut list = CommandList::new();
    list.clear().set_clear_color(true);
    list.fill_vertex_buffer().set_buffer(vb).set_data(vec![0; 36]);
    list.push(DrawCommand::new(vb, material, 3));

    let result = device.submit(list, false);

    assert!(matches!(result, Err(RenderError::StaleHandle { kind: ResourceKind::VertexBuffer, .. })));
    assert!(device.backend().dispatched().is_empty());
    assert_eq!(device.backend().vertex_buffer_data(replacement), Some(bytemuck::cast_slice::<f32, u8>(&TRIANGLE)));
}

#[test]
fn test_material_with_destroyed_texture_is_stale() {
    let mut device = device();
    let vb = triangle(&mut device);
    let texture = TextureBuilder::new().size(2, 2).data(vec![128; 16]).build(&mut device).unwrap();
    let material = MaterialBuilder::new("textured")
        .vertex_shader(VERTEX_SHADER)
        .fragment_shader(FRAGMENT_SHADER)
        .parameter("albedo", texture)
        .build(&mut device)
        .unwrap();
    device.destroy(texture).unwrap();

    let mut list = CommandList::new();
    list.push(DrawCommand::new(vb, material, 3));

    let result = device.submit(list, true);
    assert!(matches!(result, Err(RenderError::StaleHandle { kind: ResourceKind::Texture, .. })));
}

#[test]
fn test_dispatch_failure_abandons_rest_of_list() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");
    device.backend_mut().fail_on(CommandKind::Draw, BackendError::Rejected("driver timeout".to_string()));

    let mut list = CommandList::new();
    list.clear().set_clear_color(true);
    list.push(DrawCommand::new(vb, material, 3));
    list.viewport().set_rectangle(0, 0, 16, 16);

    let result = device.submit(list, false);

    match result {
        Err(RenderError::BackendDispatch { command_kind, position, reason }) => {
            assert_eq!(command_kind, CommandKind::Draw);
            assert_eq!(position, 1);
            assert!(reason.contains("driver timeout"));
        }
        other => panic!("expected dispatch failure, got {other:?}"),
    }
    assert_eq!(device.backend().dispatched(), vec![CommandKind::Clear, CommandKind::Draw]);
    assert_eq!(device.stats().submissions, 0);

    // The device stays usable once the backend recovers
    device.backend_mut().clear_failures();
    let mut list = CommandList::new();
    list.push(DrawCommand::new(vb, material, 3));
    assert!(device.submit(list, false).is_ok());
}

#[test]
fn test_out_of_bounds_draw_reported() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");

    let mut list = CommandList::new();
    list.push(DrawCommand::new(vb, material, 6));

    let result = device.submit(list, true);
    assert!(matches!(result, Err(RenderError::BackendDispatch { command_kind: CommandKind::Draw, position: 0, .. })));
}

#[test]
fn test_material_parameters_applied_before_draw() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);

    let mut list = CommandList::new();
    list.set_material_parameters().set_material(material).set_parameter("tint", red);
    list.push(DrawCommand::new(vb, material, 3));
    device.submit(list, true).unwrap();

    let tint = device.material(material).unwrap().parameters.get("tint");
    assert_eq!(tint, Some(&ParameterValue::Vec4(red)));
    assert_eq!(device.backend().dispatched(), vec![CommandKind::SetMaterialParameters, CommandKind::Draw]);
}

#[test]
fn test_failed_parameter_update_leaves_material_unchanged() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");
    device
        .backend_mut()
        .fail_on(CommandKind::SetMaterialParameters, BackendError::Rejected("uniform upload failed".to_string()));

    let mut list = CommandList::new();
    list.set_material_parameters().set_material(material).set_parameter("tint", Vec4::new(1.0, 0.0, 0.0, 1.0));
    list.push(DrawCommand::new(vb, material, 3));
    let result = device.submit(list, false);

    assert!(matches!(
        result,
        Err(RenderError::BackendDispatch { command_kind: CommandKind::SetMaterialParameters, position: 0, .. })
    ));
    assert_eq!(device.material(material).unwrap().parameters.get("tint"), None);
}

#[test]
fn test_fill_offset_overflow_reported() {
    let mut device = device();
    let vb = triangle(&mut device);

    let mut list = CommandList::new();
    list.fill_vertex_buffer().set_buffer(vb).set_data(vec![1; 12]).set_offset(usize::MAX - 4);
    let result = device.submit(list, false);

    assert!(matches!(
        result,
        Err(RenderError::BackendDispatch { command_kind: CommandKind::FillVertexBuffer, position: 0, .. })
    ));
    assert_eq!(device.backend().vertex_buffer_data(vb), Some(bytemuck::cast_slice::<f32, u8>(&TRIANGLE)));
}

#[test]
fn test_render_to_texture_then_sample() {
    let mut device = device();
    let vb = triangle(&mut device);
    let target = FrameBufferBuilder::new(64, 64).color(TextureFormat::Rgba8).build(&mut device).unwrap();
    let scene = flat_material(&mut device, "scene");
    let composite = MaterialBuilder::new("composite")
        .vertex_shader(VERTEX_SHADER)
        .fragment_shader(FRAGMENT_SHADER)
        .parameter("scene", target.color[0])
        .build(&mut device)
        .unwrap();

    let mut list = CommandList::new();
    list.frame_buffer().set_frame_buffer(target.frame_buffer);
    list.clear().set_color(0.0, 0.0, 1.0, 1.0).set_clear_color(true);
    list.push(DrawCommand::new(vb, scene, 3));
    list.frame_buffer().set_default();
    list.clear().set_clear_color(true).set_clear_depth(true);
    list.push(DrawCommand::new(vb, composite, 3));

    device.submit(list, true).unwrap();

    assert_eq!(
        device.backend().dispatched(),
        vec![
            CommandKind::FrameBuffer,
            CommandKind::Clear,
            CommandKind::Draw,
            CommandKind::FrameBuffer,
            CommandKind::Clear,
            CommandKind::Draw,
        ]
    );
    assert_eq!(device.backend().draw_target(), None);
    assert_eq!(device.backend().clear_color(Some(target.frame_buffer)), Some(Vec4::new(0.0, 0.0, 1.0, 1.0)));
}

#[test]
fn test_sampling_bound_target_rejected() {
    let mut device = device();
    let vb = triangle(&mut device);
    let target = FrameBufferBuilder::new(64, 64).color(TextureFormat::Rgba8).build(&mut device).unwrap();
    let feedback = MaterialBuilder::new("feedback")
        .vertex_shader(VERTEX_SHADER)
        .fragment_shader(FRAGMENT_SHADER)
        .parameter("scene", target.color[0])
        .build(&mut device)
        .unwrap();

    let mut list = CommandList::new();
    list.frame_buffer().set_frame_buffer(target.frame_buffer);
    list.push(DrawCommand::new(vb, feedback, 3));

    let result = device.submit(list, false);
    assert!(matches!(result, Err(RenderError::BackendDispatch { command_kind: CommandKind::Draw, position: 1, .. })));
}

#[test]
fn test_attached_texture_recorded_on_frame_buffer() {
    let mut device = device();
    let target = FrameBufferBuilder::new(64, 64).color(TextureFormat::Rgba8).build(&mut device).unwrap();
    let depth = TextureBuilder::new().size(64, 64).format(TextureFormat::Depth24Stencil8).build(&mut device).unwrap();

    let mut list = CommandList::new();
    list.frame_buffer_texture()
        .set_frame_buffer(target.frame_buffer)
        .set_texture(depth)
        .set_attachment(AttachmentPoint::DepthStencil);
    device.submit(list, true).unwrap();

    let description = device.frame_buffer_description(target.frame_buffer).unwrap();
    assert!(description
        .attachments
        .contains(&FrameBufferAttachment { point: AttachmentPoint::DepthStencil, texture: depth }));
    assert_eq!(device.backend().attachment(target.frame_buffer, AttachmentPoint::DepthStencil), Some(depth));
}

#[test]
fn test_destroyed_attachment_is_stale() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");
    let target = FrameBufferBuilder::new(64, 64).color(TextureFormat::Rgba8).build(&mut device).unwrap();
    device.destroy(target.color[0]).unwrap();
    device.backend_mut().reset_calls();

    let mut list = CommandList::new();
    list.frame_buffer().set_frame_buffer(target.frame_buffer);
    list.clear().set_clear_color(true);
    list.push(DrawCommand::new(vb, material, 3));
    let result = device.submit(list, true);

    assert!(matches!(result, Err(RenderError::StaleHandle { kind: ResourceKind::Texture, .. })));
    assert!(device.backend().dispatched().is_empty());
}

#[test]
fn test_bound_target_checked_across_submissions() {
    let mut device = device();
    let target = FrameBufferBuilder::new(64, 64).color(TextureFormat::Rgba8).build(&mut device).unwrap();

    let mut list = CommandList::new();
    list.frame_buffer().set_frame_buffer(target.frame_buffer);
    device.submit(list, false).unwrap();
    device.destroy(target.color[0]).unwrap();

    let mut list = CommandList::new();
    list.clear().set_clear_color(true);
    let result = device.submit(list, false);
    assert!(matches!(result, Err(RenderError::StaleHandle { kind: ResourceKind::Texture, .. })));

    // Rebinding the surface leaves the dead attachment behind
    let mut list = CommandList::new();
    list.frame_buffer().set_default();
    list.clear().set_clear_color(true);
    assert!(device.submit(list, false).is_ok());
}

#[test]
fn test_replaced_attachment_can_be_drawn_to() {
    let mut device = device();
    let target = FrameBufferBuilder::new(64, 64).color(TextureFormat::Rgba8).build(&mut device).unwrap();
    let replacement = TextureBuilder::new().size(64, 64).build(&mut device).unwrap();
    device.destroy(target.color[0]).unwrap();

    let mut list = CommandList::new();
    list.frame_buffer_texture()
        .set_frame_buffer(target.frame_buffer)
        .set_texture(replacement)
        .set_attachment(AttachmentPoint::Color(0));
    list.frame_buffer().set_frame_buffer(target.frame_buffer);
    list.clear().set_clear_color(true);
    device.submit(list, false).unwrap();

    assert_eq!(device.backend().attachment(target.frame_buffer, AttachmentPoint::Color(0)), Some(replacement));
}

#[test]
fn test_mipmaps_generated_for_full_chain() {
    let mut device = device();
    let texture = TextureBuilder::new().size(16, 16).full_mip_chain().data(vec![0; 16 * 16 * 4]).build(&mut device);
    let texture = texture.unwrap();

    let mut list = CommandList::new();
    list.generate_mipmaps().set_texture(texture);
    device.submit(list, true).unwrap();

    assert_eq!(device.backend().texture_levels(texture), Some(5));
}

#[test]
fn test_submit_and_swap_advances_frames() {
    let mut device = device();
    let vb = triangle(&mut device);
    let material = flat_material(&mut device, "flat");

    for _ in 0..3 {
        let mut list = CommandList::new();
        list.clear().set_clear_color(true);
        list.push(DrawCommand::new(vb, material, 3));
        device.submit_and_swap(list, true).unwrap();
    }

    assert_eq!(device.frame_index(), 3);
    assert_eq!(device.backend().stats().frames, 3);
    assert_eq!(device.backend().stats().draw_calls, 3);

    let stats = device.stats();
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.submissions, 3);
    assert_eq!(stats.commands_dispatched, 6);
    assert_eq!(stats.draw_calls, 3);
}

#[test]
fn test_present_failure_keeps_frame_index() {
    let mut device = device();
    device.backend_mut().lose_device();

    assert!(matches!(device.present(), Err(RenderError::PresentFailed(_))));
    assert_eq!(device.frame_index(), 0);
}
