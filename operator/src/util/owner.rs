use kube::api::Resource;
use kube::core::ObjectMeta;

/// Appends an owner reference pointing at `owner` to `meta`, mirroring Go's
/// `common.UpdateOwnerReferences`. Cascade deletion then follows from the
/// owner reference the control plane already understands.
pub fn set_owner<O>(meta: &mut ObjectMeta, owner: &O)
where
    O: Resource<DynamicType = ()>,
{
    let owner_ref = owner.controller_owner_ref(&()).expect("owner has no uid");
    meta.owner_references
        .get_or_insert_with(Vec::new)
        .push(owner_ref);
}
