use ceph_types::*;
use kube::CustomResourceExt;
use std::fs;

fn main() {
    let _ = fs::create_dir("../crds");
    write_crd::<CephCluster>("ceph.pgc.dev_cephclusters_crd.yaml");
    write_crd::<CephMonCluster>("ceph.pgc.dev_cephmonclusters_crd.yaml");
    write_crd::<CephDaemonCluster>("ceph.pgc.dev_cephdaemonclusters_crd.yaml");
    write_crd::<CephMon>("ceph.pgc.dev_cephmons_crd.yaml");
    write_crd::<CephDaemon>("ceph.pgc.dev_cephdaemons_crd.yaml");
    write_crd::<CephOsd>("ceph.pgc.dev_cephosds_crd.yaml");
}

fn write_crd<T: CustomResourceExt>(file_name: &str) {
    fs::write(format!("../crds/{file_name}"), serde_yaml::to_string(&T::crd()).unwrap()).unwrap();
}
